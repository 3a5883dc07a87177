//! Opportunistic command forwarding.
//!
//! Each cycle snapshots the peers currently reachable on one medium, then
//! asks the command queue for pending work for each of them and routes
//! whatever comes back. The visibility locks are released before the
//! queue or dispatcher is touched, so a slow collaborator never stalls
//! inbound observations.
//!
//! Cycles are synchronous. Hosts with their own scheduler call
//! [`Forwarder::forward`]; others can spawn [`Forwarder::run`].

use crate::error::RouterResult;
use crate::medium::Medium;
use crate::ports::CommandQueue;
use crate::router::Router;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Outcome of one forwarding cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardReport {
    /// Medium the cycle ran on
    pub medium: Medium,
    /// Peers found reachable
    pub reachable: usize,
    /// Peers that were sent a batch, in the order they were served
    pub forwarded: Vec<String>,
}

impl ForwardReport {
    fn new(medium: Medium, reachable: usize) -> Self {
        Self {
            medium,
            reachable,
            forwarded: Vec::new(),
        }
    }
}

/// Drains queued commands to peers as they become reachable.
pub struct Forwarder {
    router: Arc<Router>,
    queue: Arc<dyn CommandQueue>,
}

impl Forwarder {
    /// Forwarder over `router` pulling from `queue`.
    pub fn new(router: Arc<Router>, queue: Arc<dyn CommandQueue>) -> Self {
        Self { router, queue }
    }

    /// Router this forwarder delivers through.
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Run one cycle on `medium`.
    pub fn forward(&self, medium: Medium) -> RouterResult<ForwardReport> {
        match medium {
            Medium::Acoustic => self.forward_commands_acoustic(),
            Medium::Wireless => Ok(self.forward_commands_wireless()),
        }
    }

    /// One wireless cycle.
    ///
    /// Peers are addressed by the numeric id carried in their latest
    /// announce, so no identity lookup is needed.
    pub fn forward_commands_wireless(&self) -> ForwardReport {
        let policy = self.router.policy(Medium::Wireless);
        let peers = self.router.reachable_wireless();
        let mut report = ForwardReport::new(Medium::Wireless, peers.len());

        for peer in peers {
            let id = peer.announce.source;
            let Some(mut batch) = self.queue.poll_pending_commands(id, policy.byte_budget) else {
                continue;
            };
            info!(
                peer = %peer.peer_id,
                destination = id,
                commands = batch.commands.len(),
                bytes = batch.encoded_len(),
                "Forwarding commands over wireless"
            );
            batch.set_destination(id);
            self.router.send_direct(id, batch);
            report.forwarded.push(peer.peer_id);
        }
        report
    }

    /// One acoustic cycle.
    ///
    /// Each reachable peer is resolved to its numeric id right before its
    /// queue is polled. A name that does not resolve ends the cycle with
    /// the error; peers served earlier in the cycle keep their batches and
    /// nothing is drained for the failing peer.
    pub fn forward_commands_acoustic(&self) -> RouterResult<ForwardReport> {
        let policy = self.router.policy(Medium::Acoustic);
        let peers = self.router.reachable_acoustic();
        let mut report = ForwardReport::new(Medium::Acoustic, peers.len());

        for peer in peers {
            let id = self
                .router
                .resolver()
                .resolve_id_by_name(&peer.peer_id)
                .map_err(|e| {
                    warn!(
                        peer = %peer.peer_id,
                        forwarded = report.forwarded.len(),
                        error = %e,
                        "Aborting acoustic forwarding cycle"
                    );
                    e
                })?;
            let Some(mut batch) = self.queue.poll_pending_commands(id, policy.byte_budget) else {
                continue;
            };
            info!(
                peer = %peer.peer_id,
                destination = id,
                commands = batch.commands.len(),
                bytes = batch.encoded_len(),
                "Forwarding commands over acoustic modem"
            );
            batch.set_destination(id);
            self.router.send_acoustic(&peer.peer_id, batch);
            report.forwarded.push(peer.peer_id);
        }
        Ok(report)
    }

    /// Run cycles on `medium` every `period` until `shutdown` turns true
    /// or its sender is dropped.
    ///
    /// Periods shorter than [`MIN_FORWARD_PERIOD`] are raised to it.
    pub async fn run(self: Arc<Self>, medium: Medium, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let period = clamp_period(period);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(%medium, ?period, "Forwarder started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.forward(medium) {
                        Ok(report) => debug!(
                            %medium,
                            reachable = report.reachable,
                            forwarded = report.forwarded.len(),
                            "Forwarding cycle complete"
                        ),
                        Err(e) => warn!(%medium, error = %e, "Forwarding cycle failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!(%medium, "Forwarder stopped");
    }
}

/// Shortest period accepted by [`Forwarder::run`].
pub const MIN_FORWARD_PERIOD: Duration = Duration::from_millis(10);

fn clamp_period(period: Duration) -> Duration {
    if period < MIN_FORWARD_PERIOD {
        warn!(?period, min = ?MIN_FORWARD_PERIOD, "Forwarding period too short, clamping");
        MIN_FORWARD_PERIOD
    } else {
        period
    }
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}
