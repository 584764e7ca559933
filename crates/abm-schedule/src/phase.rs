//! The step phase state machine.
//!
//! ```text
//! Idle ──► Update ──► Execution ──► Idle
//! ```
//!
//! Every transition is a compare-and-set from the expected prior phase.  A
//! failed transition means two threads are driving the same environment, so
//! it panics instead of returning an error.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::{ScheduleError, ScheduleResult};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum Phase {
    Idle      = 0,
    Update    = 1,
    Execution = 2,
}

impl Phase {
    /// The phase that follows `self` in the cycle.
    pub fn next(self) -> Phase {
        match self {
            Phase::Idle      => Phase::Update,
            Phase::Update    => Phase::Execution,
            Phase::Execution => Phase::Idle,
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Phase {
        match raw {
            0 => Phase::Idle,
            1 => Phase::Update,
            2 => Phase::Execution,
            other => unreachable!("invalid phase byte {other}"),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Idle      => "idle",
            Phase::Update    => "update",
            Phase::Execution => "execution",
        })
    }
}

/// Atomic holder of the current [`Phase`].
pub struct PhaseCell(AtomicU8);

impl Default for PhaseCell {
    fn default() -> Self {
        PhaseCell(AtomicU8::new(Phase::Idle as u8))
    }
}

impl PhaseCell {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn current(&self) -> Phase {
        Phase::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move from `from` to its successor and return the new phase.
    ///
    /// # Panics
    ///
    /// If the current phase is not `from`.
    pub fn advance(&self, from: Phase) -> Phase {
        let to = from.next();
        if let Err(actual) =
            self.0.compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
        {
            panic!(
                "phase transition {from} -> {to} attempted while in {}",
                Phase::from_u8(actual)
            );
        }
        to
    }

    /// Fail with `PhaseViolation` if the current phase is `forbidden`.
    pub fn ensure_not(&self, forbidden: Phase, operation: &'static str) -> ScheduleResult<()> {
        let phase = self.current();
        if phase == forbidden {
            Err(ScheduleError::PhaseViolation { operation, phase })
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for PhaseCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PhaseCell").field(&self.current()).finish()
    }
}
