//! `ModificationQueue`: many producers, one consumer, strict FIFO.
//!
//! Producers are agent tasks on the worker pool (through
//! [`ModificationSink`]) and external callers.  The consumer is the
//! environment's update phase, which calls [`ModificationQueue::drain_and_apply`].
//!
//! Each enqueue holds the lock for one push; the consumer swaps the whole
//! buffer out in O(1).

use std::sync::{Mutex, MutexGuard};

use abm_agent::{AgentHandle, Message, ModificationSink};
use abm_core::{Motion, Point};
use tracing::debug;

use crate::Modification;

/// Outcome of one [`ModificationQueue::drain_and_apply`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainSummary {
    pub applied:  usize,
    pub rejected: usize,
}

impl DrainSummary {
    pub fn total(&self) -> usize {
        self.applied + self.rejected
    }
}

#[derive(Default)]
pub struct ModificationQueue {
    pending: Mutex<Vec<Modification>>,
}

impl ModificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `modification`.  Never blocks for longer than one push and
    /// never rejects.
    pub fn enqueue(&self, modification: Modification) {
        self.lock().push(modification);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Take everything enqueued so far, leaving the queue empty.
    pub fn drain(&self) -> Vec<Modification> {
        std::mem::take(&mut *self.lock())
    }

    /// Apply every pending modification in enqueue order.
    ///
    /// `apply` returns `true` if the edit took effect and `false` if it was
    /// rejected.  Edits enqueued while applying (for example by a message
    /// handler) are applied in the same call, after everything before them,
    /// so the queue is empty on return.
    ///
    /// Must only be called by a single consumer.
    pub fn drain_and_apply<F>(&self, mut apply: F) -> DrainSummary
    where
        F: FnMut(Modification) -> bool,
    {
        let mut summary = DrainSummary::default();
        loop {
            let batch = self.drain();
            if batch.is_empty() {
                break;
            }
            debug!(count = batch.len(), "applying modification batch");
            for modification in batch {
                if apply(modification) {
                    summary.applied += 1;
                } else {
                    summary.rejected += 1;
                }
            }
        }
        summary
    }

    /// Recovers from poisoning: a producer cannot panic mid-push.
    fn lock(&self) -> MutexGuard<'_, Vec<Modification>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ModificationSink for ModificationQueue {
    fn enqueue_activation(&self, agent: AgentHandle, at: Point) {
        self.enqueue(Modification::Activation(agent, at));
    }

    fn enqueue_deactivation(&self, agent: AgentHandle) {
        self.enqueue(Modification::Deactivation(agent));
    }

    fn enqueue_movement(&self, agent: AgentHandle, motion: Motion) {
        self.enqueue(Modification::Movement(agent, motion));
    }

    fn enqueue_message(&self, message: Message) {
        self.enqueue(Modification::MessageDelivery(message));
    }
}
