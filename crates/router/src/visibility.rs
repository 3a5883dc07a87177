//! Peer visibility store.
//!
//! Last-seen timestamps per peer, kept separately per medium, plus the
//! latest wireless announce and navigation state of each peer. Entries are
//! only inserted or overwritten, never removed: reachability is computed
//! on read from the stored timestamp, so stale peers simply stop being
//! reported.
//!
//! Each map sits behind its own reader/writer lock. Observations from
//! different media never contend, and any number of reachability queries
//! may run alongside each other. Every accessor releases its lock before
//! returning; callers only ever get copies.

use crate::medium::MediumPolicy;
use crate::message::{Announce, NavigationState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tidelink_core::Timestamp;

/// Last contact with a peer on one medium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerVisibility {
    /// Peer display name
    pub peer_id: String,
    /// Time of the latest observation
    pub last_seen: Timestamp,
}

/// Last wireless contact with a peer, with the announce that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirelessPeerRecord {
    /// Peer display name
    pub peer_id: String,
    /// Time of the latest announce
    pub last_seen: Timestamp,
    /// Full latest announce, used to address commands by numeric id
    pub announce: Announce,
}

/// Thread-safe visibility maps. Pure state, no policy.
#[derive(Debug, Default)]
pub struct VisibilityStore {
    acoustic: RwLock<BTreeMap<String, Timestamp>>,
    wireless: RwLock<BTreeMap<String, WirelessPeerRecord>>,
    navigation: RwLock<BTreeMap<String, NavigationState>>,
}

// The maps hold plain values and every write is a single insert, so a
// writer that panicked cannot have left an entry half-updated.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl VisibilityStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache the latest navigation state of `peer_id`.
    pub fn record_navigation_state(&self, peer_id: &str, state: NavigationState) {
        write(&self.navigation).insert(peer_id.to_string(), state);
    }

    /// Overwrite the acoustic last-seen time of `peer_id`.
    ///
    /// Last write wins: an older timestamp replaces a newer one.
    pub fn record_acoustic_contact(&self, peer_id: &str, timestamp: Timestamp) {
        write(&self.acoustic).insert(peer_id.to_string(), timestamp);
    }

    /// Overwrite the wireless last-seen time and announce of `peer_id`.
    pub fn record_wireless_contact(&self, peer_id: &str, announce: Announce, timestamp: Timestamp) {
        let record = WirelessPeerRecord {
            peer_id: peer_id.to_string(),
            last_seen: timestamp,
            announce,
        };
        write(&self.wireless).insert(peer_id.to_string(), record);
    }

    /// Acoustic last-seen time of `peer_id`, if ever observed.
    pub fn acoustic_last_seen(&self, peer_id: &str) -> Option<Timestamp> {
        read(&self.acoustic).get(peer_id).copied()
    }

    /// Wireless last-seen time of `peer_id`, if ever observed.
    pub fn wireless_last_seen(&self, peer_id: &str) -> Option<Timestamp> {
        read(&self.wireless).get(peer_id).map(|r| r.last_seen)
    }

    /// Copy of the wireless record of `peer_id`.
    pub fn wireless_contact(&self, peer_id: &str) -> Option<WirelessPeerRecord> {
        read(&self.wireless).get(peer_id).cloned()
    }

    /// Copy of the cached navigation state of `peer_id`.
    pub fn navigation_state(&self, peer_id: &str) -> Option<NavigationState> {
        read(&self.navigation).get(peer_id).cloned()
    }

    /// Peers whose acoustic contact is fresh at `now`, ordered by name.
    pub fn reachable_acoustic(&self, now: Timestamp, policy: &MediumPolicy) -> Vec<PeerVisibility> {
        read(&self.acoustic)
            .iter()
            .filter(|(_, last_seen)| policy.is_fresh(**last_seen, now))
            .map(|(peer_id, &last_seen)| PeerVisibility {
                peer_id: peer_id.clone(),
                last_seen,
            })
            .collect()
    }

    /// Peers whose wireless contact is fresh at `now`, ordered by name.
    pub fn reachable_wireless(&self, now: Timestamp, policy: &MediumPolicy) -> Vec<WirelessPeerRecord> {
        read(&self.wireless)
            .values()
            .filter(|r| policy.is_fresh(r.last_seen, now))
            .cloned()
            .collect()
    }

    /// Number of peers ever heard acoustically.
    pub fn acoustic_len(&self) -> usize {
        read(&self.acoustic).len()
    }

    /// Number of peers ever heard over wireless.
    pub fn wireless_len(&self) -> usize {
        read(&self.wireless).len()
    }

    /// Number of peers with a cached navigation state.
    pub fn navigation_len(&self) -> usize {
        read(&self.navigation).len()
    }
}
