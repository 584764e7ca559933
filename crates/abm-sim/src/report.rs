//! Per-step counters returned by [`Environment::next_step`][crate::Environment::next_step].

use std::fmt;

use abm_core::Tick;

/// What one call to `next_step` did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// Time after the step.
    pub tick: Tick,

    /// Agents activated from the queue.
    pub activated: usize,

    /// Agents removed, by queued deactivation or by the retired sweep.
    pub deactivated: usize,

    /// Movements applied.
    pub moved: usize,

    /// Message recipients reached.
    pub delivered: usize,

    /// Message recipients that were not active at delivery.
    pub undelivered: usize,

    /// Modifications skipped because they could not be applied.
    pub rejected: usize,

    /// Agent tasks run in the execution phase.
    pub executed: usize,
}

impl StepReport {
    pub(crate) fn starting_at(tick: Tick) -> Self {
        StepReport { tick, ..Self::default() }
    }
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: executed {} (+{} -{}), moved {}, delivered {}/{}, rejected {}",
            self.tick,
            self.executed,
            self.activated,
            self.deactivated,
            self.moved,
            self.delivered,
            self.delivered + self.undelivered,
            self.rejected,
        )
    }
}
