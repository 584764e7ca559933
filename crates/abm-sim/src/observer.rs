//! Lifecycle events and the observers that receive them.
//!
//! Events are published synchronously on the thread driving
//! [`Environment::next_step`][crate::Environment::next_step], after the world
//! lock has been released.  Observers must return quickly.

use std::sync::{Arc, Mutex, MutexGuard};

use abm_core::{AgentId, Point, Tick};
use tracing::{debug, info};

use crate::StepReport;

// ── SimEvent ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    AgentActivated { agent: AgentId, at: Point, tick: Tick },
    AgentDeactivated { agent: AgentId, tick: Tick },
    TimeAdvanced { from: Tick, to: Tick },
}

impl SimEvent {
    /// Call the hook on `observer` that matches this event.
    pub fn dispatch(&self, observer: &mut dyn SimObserver) {
        match *self {
            SimEvent::AgentActivated { agent, at, tick } => {
                observer.on_agent_activated(agent, at, tick)
            }
            SimEvent::AgentDeactivated { agent, tick } => {
                observer.on_agent_deactivated(agent, tick)
            }
            SimEvent::TimeAdvanced { from, to } => observer.on_time_advanced(from, to),
        }
    }
}

// ── SimObserver ───────────────────────────────────────────────────────────────

/// Callbacks invoked by the environment during `next_step`.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter { interval: u64 }
///
/// impl SimObserver for ProgressPrinter {
///     fn on_step_end(&mut self, report: &StepReport) {
///         if report.tick.0 % self.interval == 0 {
///             println!("{report}");
///         }
///     }
/// }
/// ```
pub trait SimObserver: Send {
    /// An agent was activated during the update of `tick`.
    fn on_agent_activated(&mut self, _agent: AgentId, _at: Point, _tick: Tick) {}

    /// An agent was removed during the update of `tick`.
    fn on_agent_deactivated(&mut self, _agent: AgentId, _tick: Tick) {}

    /// The time counter moved from `from` to `to`.
    fn on_time_advanced(&mut self, _from: Tick, _to: Tick) {}

    /// Called once after every successful step.
    fn on_step_end(&mut self, _report: &StepReport) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Forwards events to `tracing`: steps at `info`, agent lifecycle at `debug`.
pub struct TracingObserver;

impl SimObserver for TracingObserver {
    fn on_agent_activated(&mut self, agent: AgentId, at: Point, tick: Tick) {
        debug!(%agent, x = at.x, y = at.y, %tick, "agent activated");
    }

    fn on_agent_deactivated(&mut self, agent: AgentId, tick: Tick) {
        debug!(%agent, %tick, "agent deactivated");
    }

    fn on_step_end(&mut self, report: &StepReport) {
        info!(
            tick        = report.tick.0,
            executed    = report.executed,
            activated   = report.activated,
            deactivated = report.deactivated,
            moved       = report.moved,
            rejected    = report.rejected,
            "step complete"
        );
    }
}

// ── EventLog ──────────────────────────────────────────────────────────────────

/// Records every event in order.
///
/// Clones share the same log, so a clone can be handed to the environment and
/// the original kept for reading.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<SimEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn events(&self) -> Vec<SimEvent> {
        self.lock().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<SimEvent> {
        std::mem::take(&mut *self.lock())
    }

    fn push(&self, event: SimEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SimEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SimObserver for EventLog {
    fn on_agent_activated(&mut self, agent: AgentId, at: Point, tick: Tick) {
        self.push(SimEvent::AgentActivated { agent, at, tick });
    }

    fn on_agent_deactivated(&mut self, agent: AgentId, tick: Tick) {
        self.push(SimEvent::AgentDeactivated { agent, tick });
    }

    fn on_time_advanced(&mut self, from: Tick, to: Tick) {
        self.push(SimEvent::TimeAdvanced { from, to });
    }
}
