//! In-process implementations of the collaborator contracts.
//!
//! Used by the node service and by tests. Field deployments may swap any
//! of these for their own identity service, store or transport.

use crate::error::IdentityError;
use crate::message::{CommandBatch, Envelope, QueuedCommand, SystemId};
use crate::ports::{CommandQueue, Dispatcher, IdentityResolver};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tidelink_core::PeerEntry;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Fixed bidirectional name/id table.
#[derive(Debug, Default, Clone)]
pub struct StaticIdentityResolver {
    by_name: HashMap<String, SystemId>,
    by_id: HashMap<SystemId, String>,
}

impl StaticIdentityResolver {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table built from configured peers.
    pub fn from_peers(peers: &[PeerEntry]) -> Self {
        let mut resolver = Self::new();
        for peer in peers {
            resolver.insert(&peer.name, peer.id);
        }
        resolver
    }

    /// Add or replace a mapping.
    pub fn insert(&mut self, name: &str, id: SystemId) {
        if let Some(old_id) = self.by_name.insert(name.to_string(), id) {
            self.by_id.remove(&old_id);
        }
        if let Some(old_name) = self.by_id.insert(id, name.to_string()) {
            if old_name != name {
                self.by_name.remove(&old_name);
            }
        }
    }

    /// Number of known systems.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// True when no systems are known.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl IdentityResolver for StaticIdentityResolver {
    fn resolve_id_by_name(&self, name: &str) -> Result<SystemId, IdentityError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| IdentityError::UnknownName(name.to_string()))
    }

    fn resolve_name_by_id(&self, id: SystemId) -> Result<String, IdentityError> {
        self.by_id
            .get(&id)
            .cloned()
            .ok_or(IdentityError::UnknownId(id))
    }
}

/// Per-destination FIFO command store.
#[derive(Debug, Default)]
pub struct InMemoryCommandQueue {
    queues: Mutex<HashMap<SystemId, VecDeque<QueuedCommand>>>,
    next_id: AtomicU64,
}

impl InMemoryCommandQueue {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `payload` for `destination`, returning the command id.
    pub fn enqueue(&self, destination: SystemId, payload: Vec<u8>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        queues
            .entry(destination)
            .or_default()
            .push_back(QueuedCommand { id, payload });
        debug!(destination, command_id = id, "Queued command");
        id
    }

    /// Commands still waiting for `destination`.
    pub fn pending_count(&self, destination: SystemId) -> usize {
        let queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        queues.get(&destination).map_or(0, VecDeque::len)
    }
}

impl CommandQueue for InMemoryCommandQueue {
    fn poll_pending_commands(
        &self,
        destination: SystemId,
        max_bytes: usize,
    ) -> Option<CommandBatch> {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = queues.get_mut(&destination)?;

        let mut taken = Vec::new();
        let mut used = 0usize;
        while let Some(front) = queue.front() {
            if used + front.payload.len() > max_bytes {
                break;
            }
            used += front.payload.len();
            if let Some(cmd) = queue.pop_front() {
                taken.push(cmd);
            }
        }

        if taken.is_empty() {
            if let Some(front) = queue.front() {
                warn!(
                    destination,
                    command_id = front.id,
                    size = front.payload.len(),
                    max_bytes,
                    "Pending command exceeds byte budget"
                );
            }
            return None;
        }
        Some(CommandBatch::new(taken))
    }
}

/// Dispatcher that keeps every envelope it is handed.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<Envelope>>,
}

impl RecordingDispatcher {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything dispatched so far.
    pub fn envelopes(&self) -> Vec<Envelope> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of dispatches so far.
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Dispatcher for RecordingDispatcher {
    fn dispatch(&self, envelope: Envelope) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(envelope);
    }
}

/// Dispatcher feeding an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl ChannelDispatcher {
    /// Dispatcher plus the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Dispatcher for ChannelDispatcher {
    fn dispatch(&self, envelope: Envelope) {
        if self.tx.send(envelope).is_err() {
            warn!("Outbound channel closed, dropping envelope");
        }
    }
}
