//! Configuration management for Tidelink.
//!
//! Every section is optional in the TOML file; omitted sections and keys
//! take the defaults below.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
#[cfg(feature = "toml")]
use std::path::Path;

/// Top-level node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local vehicle identity
    pub node: NodeConfig,
    /// Reachability windows and delivery budgets
    pub router: RouterConfig,
    /// Forwarding cadence
    pub forwarder: ForwarderConfig,
    /// Log output
    pub logging: LoggingConfig,
    /// Static identity table
    pub peers: Vec<PeerEntry>,
}

/// Local vehicle identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Display name of this vehicle
    pub name: String,
    /// Numeric system id of this vehicle
    pub system_id: u16,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "tidelink-node".to_string(),
            system_id: 0,
        }
    }
}

/// Per-medium staleness windows and byte budgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// A peer is acoustically reachable while `now - last_seen` is below this
    pub acoustic_window_secs: f64,
    /// A peer is reachable over wireless while `now - last_seen` is below this
    pub wireless_window_secs: f64,
    /// Maximum payload bytes polled per peer per acoustic cycle
    pub acoustic_byte_budget: usize,
    /// Maximum payload bytes polled per peer per wireless cycle
    pub wireless_byte_budget: usize,
}

impl RouterConfig {
    /// Default acoustic staleness window (seconds)
    pub const DEFAULT_ACOUSTIC_WINDOW_SECS: f64 = 120.0;
    /// Default wireless staleness window (seconds)
    pub const DEFAULT_WIRELESS_WINDOW_SECS: f64 = 15.0;
    /// Default acoustic byte budget
    pub const DEFAULT_ACOUSTIC_BYTE_BUDGET: usize = 1000;
    /// Default wireless byte budget (32 KiB)
    pub const DEFAULT_WIRELESS_BYTE_BUDGET: usize = 32 * 1024;
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            acoustic_window_secs: Self::DEFAULT_ACOUSTIC_WINDOW_SECS,
            wireless_window_secs: Self::DEFAULT_WIRELESS_WINDOW_SECS,
            acoustic_byte_budget: Self::DEFAULT_ACOUSTIC_BYTE_BUDGET,
            wireless_byte_budget: Self::DEFAULT_WIRELESS_BYTE_BUDGET,
        }
    }
}

/// How often each forwarder cycle runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Seconds between acoustic forwarding cycles
    pub acoustic_interval_secs: u64,
    /// Seconds between wireless forwarding cycles
    pub wireless_interval_secs: u64,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            acoustic_interval_secs: 10,
            wireless_interval_secs: 1,
        }
    }
}

/// Log output settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// One row of the static identity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerEntry {
    /// Display name
    pub name: String,
    /// Numeric system id
    pub id: u16,
}

impl Config {
    /// Load and validate a TOML configuration file.
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), peers = config.peers.len(), "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate TOML text.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults with an empty identity table.
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Reject configurations the router cannot operate with.
    pub fn validate(&self) -> Result<()> {
        let r = &self.router;
        for (key, window) in [
            ("router.acoustic_window_secs", r.acoustic_window_secs),
            ("router.wireless_window_secs", r.wireless_window_secs),
        ] {
            if !window.is_finite() || window <= 0.0 {
                return Err(CoreError::Config(format!(
                    "{key} must be a positive number of seconds, got {window}"
                )));
            }
        }
        if r.acoustic_byte_budget == 0 || r.wireless_byte_budget == 0 {
            return Err(CoreError::Config("router byte budgets must be non-zero".to_string()));
        }
        if self.forwarder.acoustic_interval_secs == 0 || self.forwarder.wireless_interval_secs == 0 {
            return Err(CoreError::Config(
                "forwarder intervals must be at least one second".to_string(),
            ));
        }

        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for peer in &self.peers {
            if peer.name.is_empty() {
                return Err(CoreError::Config(format!("peer {} has an empty name", peer.id)));
            }
            if !names.insert(peer.name.as_str()) {
                return Err(CoreError::Config(format!("duplicate peer name {}", peer.name)));
            }
            if !ids.insert(peer.id) {
                return Err(CoreError::Config(format!("duplicate peer id {}", peer.id)));
            }
        }
        Ok(())
    }
}
