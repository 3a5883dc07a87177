//! Collaborator contracts consumed by the router.
//!
//! The router owns none of these; hosts plug in their identity service,
//! command store and outbound transport.

use crate::error::IdentityError;
use crate::message::{CommandBatch, Envelope, SystemId};

/// Maps between numeric system ids and display names.
///
/// Must be idempotent and total for every peer the router has observed.
pub trait IdentityResolver: Send + Sync {
    /// Numeric id of the system called `name`.
    fn resolve_id_by_name(&self, name: &str) -> Result<SystemId, IdentityError>;

    /// Display name of system `id`.
    fn resolve_name_by_id(&self, id: SystemId) -> Result<String, IdentityError>;
}

/// Store of commands awaiting delivery.
pub trait CommandQueue: Send + Sync {
    /// Take up to `max_bytes` of pending commands for `destination`.
    ///
    /// `None` means nothing is pending. Returned commands are drained.
    fn poll_pending_commands(&self, destination: SystemId, max_bytes: usize)
        -> Option<CommandBatch>;
}

/// Fire-and-forget outbound transport.
pub trait Dispatcher: Send + Sync {
    /// Hand `envelope` to the transport.
    fn dispatch(&self, envelope: Envelope);
}
