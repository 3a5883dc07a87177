//! Messages flowing into and out of the router.
//!
//! Inbound [`Observation`]s refresh peer visibility; outbound
//! [`Envelope`]s carry queued command batches to a dispatcher.

use serde::{Deserialize, Serialize};
use tidelink_core::Timestamp;

/// Numeric vehicle address.
pub type SystemId = u16;

/// A single command waiting for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedCommand {
    /// Queue-assigned identifier
    pub id: u64,
    /// Encoded command
    pub payload: Vec<u8>,
}

/// Batch of commands addressed to one peer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommandBatch {
    /// Destination system, set when the batch is addressed
    pub destination: Option<SystemId>,
    /// Commands in queue order
    pub commands: Vec<QueuedCommand>,
}

impl CommandBatch {
    /// Unaddressed batch.
    pub fn new(commands: Vec<QueuedCommand>) -> Self {
        Self {
            destination: None,
            commands,
        }
    }

    /// Total payload bytes.
    pub fn encoded_len(&self) -> usize {
        self.commands.iter().map(|c| c.payload.len()).sum()
    }

    /// True when the batch carries no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Address the batch to `destination`.
    pub fn set_destination(&mut self, destination: SystemId) {
        self.destination = Some(destination);
    }
}

/// Periodic presence announcement heard over wireless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announce {
    /// Announcing system's display name
    pub sys_name: String,
    /// Announcing system's numeric id
    pub source: SystemId,
    /// Latitude (radians)
    pub lat: f64,
    /// Longitude (radians)
    pub lon: f64,
    /// Advertised services
    #[serde(default)]
    pub services: String,
    /// Time the announce was received
    pub timestamp: Timestamp,
}

/// Latest navigation estimate reported by a peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationState {
    /// Reporting system's numeric id
    pub source: SystemId,
    /// Latitude (radians)
    pub lat: f64,
    /// Longitude (radians)
    pub lon: f64,
    /// Depth (metres)
    pub depth: f32,
    /// Heading (radians)
    pub heading: f32,
    /// Time the estimate was received
    pub timestamp: Timestamp,
}

/// Frame received through the acoustic modem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcousticFrame {
    /// Sending system's display name
    pub sys_src: String,
    /// Addressed system's display name
    pub sys_dst: String,
    /// Receipt time
    pub timestamp: Timestamp,
    /// Raw frame payload
    #[serde(default)]
    pub data: Vec<u8>,
}

/// Inbound event consumed by [`crate::Router::process`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    /// Navigation-state update
    Navigation(NavigationState),
    /// Acoustic frame receipt
    AcousticFrame(AcousticFrame),
    /// Wireless announce
    Announce(Announce),
}

/// Outbound unit handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum Envelope {
    /// Acoustic-modem message operation addressed by system name
    Acoustic {
        /// Destination display name
        system: String,
        /// Batch to transmit
        batch: CommandBatch,
    },
    /// Direct delivery over the wireless network
    Direct {
        /// Destination system id
        destination: SystemId,
        /// Batch to transmit
        batch: CommandBatch,
    },
}

impl Envelope {
    /// Batch carried by the envelope.
    pub fn batch(&self) -> &CommandBatch {
        match self {
            Envelope::Acoustic { batch, .. } | Envelope::Direct { batch, .. } => batch,
        }
    }
}
