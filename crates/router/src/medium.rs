//! Transport media and their reachability policy.
//!
//! The two media differ by orders of magnitude in range and contact rate,
//! so each carries its own staleness window and per-cycle byte budget.

use serde::{Deserialize, Serialize};
use std::fmt;
use tidelink_core::{RouterConfig, Timestamp};

/// Physical communication channel to a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Medium {
    /// Long-range, low-bandwidth acoustic modem link
    Acoustic,
    /// Short-range, high-bandwidth wireless link
    Wireless,
}

impl Medium {
    /// Both media, acoustic first.
    pub const ALL: [Medium; 2] = [Medium::Acoustic, Medium::Wireless];
}

impl fmt::Display for Medium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Medium::Acoustic => f.write_str("acoustic"),
            Medium::Wireless => f.write_str("wireless"),
        }
    }
}

/// Staleness window and byte budget for one medium.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediumPolicy {
    /// Seconds after the last contact during which the peer counts as reachable
    pub window_secs: f64,
    /// Maximum payload bytes polled per peer per forwarding cycle
    pub byte_budget: usize,
}

impl MediumPolicy {
    /// Policy for `medium` taken from the router configuration.
    pub fn from_config(medium: Medium, config: &RouterConfig) -> Self {
        match medium {
            Medium::Acoustic => Self {
                window_secs: config.acoustic_window_secs,
                byte_budget: config.acoustic_byte_budget,
            },
            Medium::Wireless => Self {
                window_secs: config.wireless_window_secs,
                byte_budget: config.wireless_byte_budget,
            },
        }
    }

    /// True iff a contact at `last_seen` is still fresh at `now`.
    #[inline]
    pub fn is_fresh(&self, last_seen: Timestamp, now: Timestamp) -> bool {
        now - last_seen < self.window_secs
    }
}
