//! `ModificationSink`: the write side of a tick.

use abm_core::{Motion, Point};

use crate::{AgentHandle, Message};

/// Accepts deferred world edits.
///
/// Implemented by the modification queue in `abm-schedule`.  Every method
/// must succeed without blocking for long and must be callable from many
/// threads at once; edits are applied in the order they were accepted.
pub trait ModificationSink: Send + Sync {
    /// Request that `agent` be activated at `at`.
    fn enqueue_activation(&self, agent: AgentHandle, at: Point);

    /// Request that `agent` be removed.
    fn enqueue_deactivation(&self, agent: AgentHandle);

    /// Request that `agent` be moved by `motion` (clipped at walls).
    fn enqueue_movement(&self, agent: AgentHandle, motion: Motion);

    /// Request delivery of `message` to its recipients.
    fn enqueue_message(&self, message: Message);
}
