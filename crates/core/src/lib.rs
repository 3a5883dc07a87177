//! Core functionality for the Tidelink opportunistic message router.
//!
//! This crate provides the time base, configuration, logging and error
//! types shared by the router crate and the node service.

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::{Config, ForwarderConfig, LoggingConfig, NodeConfig, PeerEntry, RouterConfig};
pub use error::{CoreError, Result};
