//! Tidelink Router - opportunistic dual-medium message routing
//!
//! Tracks, per peer vehicle, how recently each transport has proven
//! reachable and uses that recency as a liveness proxy when delivering
//! commands.
//!
//! # Core Components
//!
//! - **VisibilityStore**: per-medium last-seen maps behind reader/writer locks
//! - **Router**: ingests observations, answers reachability queries, gates delivery
//! - **Forwarder**: drains queued commands to peers while they are reachable
//!
//! # Media
//!
//! | Medium   | Window | Budget per cycle |
//! |----------|--------|------------------|
//! | Acoustic | 120 s  | 1000 bytes       |
//! | Wireless | 15 s   | 32 KiB           |
//!
//! # Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use tidelink_core::{ManualClock, RouterConfig};
//! use tidelink_router::{
//!     CommandBatch, Medium, RecordingDispatcher, Router, StaticIdentityResolver,
//! };
//!
//! let mut resolver = StaticIdentityResolver::new();
//! resolver.insert("auv-1", 21);
//! let clock = Arc::new(ManualClock::new(0.0));
//! let dispatcher = Arc::new(RecordingDispatcher::new());
//! let router = Router::new(&RouterConfig::default(), Arc::new(resolver), dispatcher.clone(), clock.clone());
//!
//! router.record_acoustic_contact("auv-1", 0.0);
//! clock.set(100.0);
//! assert!(router.route_over_acoustic("auv-1", CommandBatch::default()));
//! clock.set(130.0);
//! assert!(!router.is_reachable(Medium::Acoustic, "auv-1"));
//! assert_eq!(dispatcher.count(), 1);
//! ```

#![warn(missing_docs)]

pub mod collaborators;
pub mod error;
pub mod forwarder;
pub mod medium;
pub mod message;
pub mod ports;
pub mod router;
pub mod visibility;

// Re-export main types
pub use collaborators::{
    ChannelDispatcher, InMemoryCommandQueue, RecordingDispatcher, StaticIdentityResolver,
};
pub use error::{IdentityError, RouterError, RouterResult};
pub use forwarder::{ForwardReport, Forwarder, MIN_FORWARD_PERIOD};
pub use medium::{Medium, MediumPolicy};
pub use message::{
    AcousticFrame, Announce, CommandBatch, Envelope, NavigationState, Observation, QueuedCommand,
    SystemId,
};
pub use ports::{CommandQueue, Dispatcher, IdentityResolver};
pub use router::{Router, RouterStatus};
pub use visibility::{PeerVisibility, VisibilityStore, WirelessPeerRecord};
