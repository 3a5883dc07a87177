//! Visibility-gated router
//!
//! Ingests inbound observations, answers per-medium reachability queries
//! and performs gate-and-forward delivery. Which medium to try is the
//! caller's decision; the router only checks that the peer currently looks
//! reachable on it and hands the batch to the dispatcher.

use crate::error::RouterResult;
use crate::medium::{Medium, MediumPolicy};
use crate::message::{Announce, CommandBatch, Envelope, NavigationState, Observation, SystemId};
use crate::ports::{Dispatcher, IdentityResolver};
use crate::visibility::{PeerVisibility, VisibilityStore, WirelessPeerRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tidelink_core::{Clock, RouterConfig, Timestamp};
use tracing::{debug, warn};

/// Snapshot of router state for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterStatus {
    /// Peers ever heard acoustically
    pub acoustic_peers: usize,
    /// Peers ever heard over wireless
    pub wireless_peers: usize,
    /// Peers with a cached navigation state
    pub navigation_entries: usize,
    /// Peers currently reachable acoustically
    pub reachable_acoustic: usize,
    /// Peers currently reachable over wireless
    pub reachable_wireless: usize,
}

/// Opportunistic dual-medium router.
pub struct Router {
    store: VisibilityStore,
    acoustic: MediumPolicy,
    wireless: MediumPolicy,
    resolver: Arc<dyn IdentityResolver>,
    dispatcher: Arc<dyn Dispatcher>,
    clock: Arc<dyn Clock>,
}

impl Router {
    /// Create a router with empty visibility maps.
    pub fn new(
        config: &RouterConfig,
        resolver: Arc<dyn IdentityResolver>,
        dispatcher: Arc<dyn Dispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store: VisibilityStore::new(),
            acoustic: MediumPolicy::from_config(Medium::Acoustic, config),
            wireless: MediumPolicy::from_config(Medium::Wireless, config),
            resolver,
            dispatcher,
            clock,
        }
    }

    /// Apply one inbound observation.
    ///
    /// Only navigation updates can fail, when their source id does not
    /// resolve to a name.
    pub fn process(&self, observation: Observation) -> RouterResult<()> {
        match observation {
            Observation::Navigation(state) => self.record_navigation_state(state.source, state),
            Observation::AcousticFrame(frame) => {
                self.record_acoustic_contact(&frame.sys_src, frame.timestamp);
                Ok(())
            }
            Observation::Announce(announce) => {
                let name = announce.sys_name.clone();
                let timestamp = announce.timestamp;
                self.record_wireless_contact(&name, announce, timestamp);
                Ok(())
            }
        }
    }

    /// Cache `state` under the display name of `peer`.
    pub fn record_navigation_state(&self, peer: SystemId, state: NavigationState) -> RouterResult<()> {
        let name = self.resolver.resolve_name_by_id(peer).map_err(|e| {
            warn!(peer, error = %e, "Dropping navigation state from unresolved system");
            e
        })?;
        debug!(peer = %name, "Navigation state updated");
        self.store.record_navigation_state(&name, state);
        Ok(())
    }

    /// Refresh the acoustic last-seen time of `peer`.
    pub fn record_acoustic_contact(&self, peer: &str, timestamp: Timestamp) {
        debug!(peer, timestamp, "Acoustic contact");
        self.store.record_acoustic_contact(peer, timestamp);
    }

    /// Refresh the wireless last-seen time and cached announce of `peer`.
    pub fn record_wireless_contact(&self, peer: &str, announce: Announce, timestamp: Timestamp) {
        debug!(peer, timestamp, "Wireless contact");
        self.store.record_wireless_contact(peer, announce, timestamp);
    }

    /// True iff `peer` was heard acoustically within the acoustic window.
    pub fn is_reachable_acoustic(&self, peer: &str) -> bool {
        let now = self.clock.now();
        self.store
            .acoustic_last_seen(peer)
            .is_some_and(|last_seen| self.acoustic.is_fresh(last_seen, now))
    }

    /// True iff `peer` announced over wireless within the wireless window.
    pub fn is_reachable_wireless(&self, peer: &str) -> bool {
        let now = self.clock.now();
        self.store
            .wireless_last_seen(peer)
            .is_some_and(|last_seen| self.wireless.is_fresh(last_seen, now))
    }

    /// Reachability of `peer` on `medium`.
    pub fn is_reachable(&self, medium: Medium, peer: &str) -> bool {
        match medium {
            Medium::Acoustic => self.is_reachable_acoustic(peer),
            Medium::Wireless => self.is_reachable_wireless(peer),
        }
    }

    /// Send `batch` to `destination` through the acoustic modem.
    ///
    /// Returns `false` without dispatching when the destination is not
    /// acoustically reachable. Transport-level failure is not observed.
    pub fn route_over_acoustic(&self, destination: &str, batch: CommandBatch) -> bool {
        if !self.is_reachable_acoustic(destination) {
            debug!(destination, "Not reachable over acoustic");
            return false;
        }
        self.send_acoustic(destination, batch);
        true
    }

    /// Send `batch` to `destination` over wireless.
    ///
    /// Returns `Ok(false)` without dispatching when the destination is not
    /// reachable over wireless; an identity resolution failure is returned
    /// as an error and nothing is dispatched.
    pub fn route_over_wireless(&self, destination: &str, mut batch: CommandBatch) -> RouterResult<bool> {
        if !self.is_reachable_wireless(destination) {
            debug!(destination, "Not reachable over wireless");
            return Ok(false);
        }
        let id = self.resolver.resolve_id_by_name(destination)?;
        batch.set_destination(id);
        self.send_direct(id, batch);
        Ok(true)
    }

    /// Cached navigation state of the peer called `name`.
    pub fn navigation_state(&self, name: &str) -> Option<NavigationState> {
        self.store.navigation_state(name)
    }

    /// Names of the peers currently reachable on `medium`, ordered by name.
    pub fn reachable_peers(&self, medium: Medium) -> Vec<String> {
        match medium {
            Medium::Acoustic => self.reachable_acoustic().into_iter().map(|p| p.peer_id).collect(),
            Medium::Wireless => self.reachable_wireless().into_iter().map(|p| p.peer_id).collect(),
        }
    }

    /// Current counts.
    pub fn status(&self) -> RouterStatus {
        RouterStatus {
            acoustic_peers: self.store.acoustic_len(),
            wireless_peers: self.store.wireless_len(),
            navigation_entries: self.store.navigation_len(),
            reachable_acoustic: self.reachable_acoustic().len(),
            reachable_wireless: self.reachable_wireless().len(),
        }
    }

    /// Policy in force for `medium`.
    pub fn policy(&self, medium: Medium) -> MediumPolicy {
        match medium {
            Medium::Acoustic => self.acoustic,
            Medium::Wireless => self.wireless,
        }
    }

    pub(crate) fn resolver(&self) -> &dyn IdentityResolver {
        self.resolver.as_ref()
    }

    pub(crate) fn reachable_acoustic(&self) -> Vec<PeerVisibility> {
        self.store.reachable_acoustic(self.clock.now(), &self.acoustic)
    }

    pub(crate) fn reachable_wireless(&self) -> Vec<WirelessPeerRecord> {
        self.store.reachable_wireless(self.clock.now(), &self.wireless)
    }

    pub(crate) fn send_acoustic(&self, system: &str, batch: CommandBatch) {
        self.dispatcher.dispatch(Envelope::Acoustic {
            system: system.to_string(),
            batch,
        });
    }

    pub(crate) fn send_direct(&self, destination: SystemId, batch: CommandBatch) {
        self.dispatcher.dispatch(Envelope::Direct { destination, batch });
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("acoustic", &self.acoustic)
            .field("wireless", &self.wireless)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
