//! The `Environment` struct and its step cycle.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use abm_agent::{AgentHandle, EnvironmentId, Message, ModificationSink, StepContext};
use abm_core::{AgentId, AgentRng, Point, SimConfig, Tick};
use abm_schedule::{Modification, ModificationQueue, Phase, PhaseCell};
use abm_spatial::PointSpace;
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, error};

use crate::world::World;
use crate::{SimError, SimEvent, SimObserver, SimResult, StepReport};

// ── Environment ───────────────────────────────────────────────────────────────

/// The step scheduler.
///
/// Each call to [`next_step`](Self::next_step) runs one full cycle:
///
/// 1. **Update** (calling thread, world write-locked): drain the modification
///    queue in FIFO order, then sweep agents whose active flag was cleared.
/// 2. **Execution** (worker pool, world read-locked): run
///    [`Agent::execute`][abm_agent::Agent::execute] once per active agent.
///    Agents read the point space and enqueue modifications; nothing else
///    mutates the world.
/// 3. Advance the time counter and publish `TimeAdvanced`.
/// 4. Back to idle.
///
/// Steps are single-flight: concurrent callers of `next_step` block.  All
/// other methods take `&self`, so an `Environment` can be shared behind an
/// `Arc` with external producers.
///
/// Create via [`EnvironmentBuilder`][crate::EnvironmentBuilder].
pub struct Environment {
    pub(crate) id:        EnvironmentId,
    pub(crate) config:    SimConfig,
    pub(crate) phase:     PhaseCell,
    pub(crate) time:      AtomicU64,
    pub(crate) step_lock: Mutex<()>,
    pub(crate) world:     RwLock<World>,
    pub(crate) queue:     ModificationQueue,
    pub(crate) pool:      ThreadPool,
    pub(crate) observers: Mutex<Vec<Box<dyn SimObserver>>>,
}

impl Environment {
    // ── Stepping ──────────────────────────────────────────────────────────

    /// Run one tick.
    ///
    /// If an agent task fails, panics, or exceeds the configured timeout, the
    /// step returns that error without advancing time.  Modifications that
    /// other agents already enqueued stay queued and are applied by the next
    /// step.
    pub fn next_step(&self) -> SimResult<StepReport> {
        let _single_flight = self.step_lock.lock().unwrap_or_else(|p| p.into_inner());
        let tick = self.current_time();
        let mut report = StepReport::starting_at(tick);

        // ── Update ────────────────────────────────────────────────────────
        self.phase.advance(Phase::Idle);
        let mut events = Vec::new();
        let handles = {
            let mut world = self.write_world();
            let summary = self.queue.drain_and_apply(|modification| {
                world.apply(self.id, modification, tick, &mut report, &mut events)
            });
            report.rejected = summary.rejected;

            for agent in world.sweep_retired(self.id) {
                report.deactivated += 1;
                events.push(SimEvent::AgentDeactivated { agent, tick });
            }
            world.snapshot()
        };
        debug!(
            %tick,
            activated   = report.activated,
            deactivated = report.deactivated,
            moved       = report.moved,
            rejected    = report.rejected,
            "update phase done"
        );
        self.publish(&events);

        // ── Execution ─────────────────────────────────────────────────────
        self.phase.advance(Phase::Update);
        let outcome = {
            let world = self.read_world();
            self.execute_all(&world.space, &handles, tick)
        };
        if let Err(e) = outcome {
            self.phase.advance(Phase::Execution);
            return Err(e);
        }
        report.executed = handles.len();
        debug!(%tick, executed = report.executed, "execution phase done");

        // ── Advance ───────────────────────────────────────────────────────
        let next = Tick(self.time.fetch_add(1, Ordering::AcqRel) + 1);
        report.tick = next;
        self.notify(|observer| {
            observer.on_time_advanced(tick, next);
            observer.on_step_end(&report);
        });
        self.phase.advance(Phase::Execution);
        Ok(report)
    }

    /// Run `n` steps, stopping at the first error.
    pub fn run_ticks(&self, n: u64) -> SimResult<Vec<StepReport>> {
        (0..n).map(|_| self.next_step()).collect()
    }

    fn execute_all(&self, space: &PointSpace, handles: &[AgentHandle], tick: Tick) -> SimResult<()> {
        let seed = self.config.seed;
        let limit = self.config.task_timeout();
        let sink: &dyn ModificationSink = &self.queue;
        self.pool.install(|| {
            handles
                .par_iter()
                .try_for_each(|handle| run_task(handle, space, sink, seed, tick, limit))
        })
    }

    fn publish(&self, events: &[SimEvent]) {
        if events.is_empty() {
            return;
        }
        self.notify(|observer| {
            for event in events {
                event.dispatch(observer);
            }
        });
    }

    /// Run `f` against every observer.  A panicking observer is logged and
    /// skipped so the phase cycle always completes.
    fn notify(&self, mut f: impl FnMut(&mut dyn SimObserver)) {
        let mut observers = self.lock_observers();
        for (index, observer) in observers.iter_mut().enumerate() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(observer.as_mut())));
            if let Err(payload) = outcome {
                let message = panic_message(payload.as_ref());
                error!(observer = index, %message, "observer panicked");
            }
        }
    }

    // ── External producers ────────────────────────────────────────────────

    /// Queue `agent` for activation at `at` in the next update.
    ///
    /// Fails with `PhaseViolation` while the environment is applying
    /// modifications.
    ///
    /// The phase check and the push are not atomic together.  A call that
    /// passes the check just as an update begins may land in that update's
    /// drain or, if the drain has already finished, in the next one.  Either
    /// way the modification is applied exactly once.
    pub fn enqueue_addition(&self, agent: AgentHandle, at: Point) -> SimResult<()> {
        self.phase.ensure_not(Phase::Update, "enqueue_addition")?;
        self.queue.enqueue(Modification::Activation(agent, at));
        Ok(())
    }

    /// Queue `agent` for removal in the next update.
    ///
    /// Same phase rules as [`enqueue_addition`](Self::enqueue_addition).
    pub fn enqueue_removal(&self, agent: AgentHandle) -> SimResult<()> {
        self.phase.ensure_not(Phase::Update, "enqueue_removal")?;
        self.queue.enqueue(Modification::Deactivation(agent));
        Ok(())
    }

    /// Queue a message from outside the simulation.
    ///
    /// Same phase rules as [`enqueue_addition`](Self::enqueue_addition).
    pub fn enqueue_message(&self, to: Vec<AgentId>, payload: Vec<u8>) -> SimResult<()> {
        self.phase.ensure_not(Phase::Update, "enqueue_message")?;
        self.queue.enqueue(Modification::MessageDelivery(Message::new(None, to, payload)));
        Ok(())
    }

    /// Register an observer for all future events.
    pub fn add_observer(&self, observer: impl SimObserver + 'static) {
        self.lock_observers().push(Box::new(observer));
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> EnvironmentId {
        self.id
    }

    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn current_time(&self) -> Tick {
        Tick(self.time.load(Ordering::Acquire))
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase.current()
    }

    /// Point-in-time copy of the agent collection, in id order.
    ///
    /// Blocks while an update is in progress.
    pub fn active_agents(&self) -> Vec<AgentHandle> {
        self.read_world().agents.values().cloned().collect()
    }

    pub fn agent_count(&self) -> usize {
        self.read_world().agents.len()
    }

    pub fn position_of(&self, agent: AgentId) -> SimResult<Point> {
        Ok(self.read_world().space.position_of(agent)?)
    }

    /// Run `f` against the point space.
    pub fn with_space<R>(&self, f: impl FnOnce(&PointSpace) -> R) -> R {
        f(&self.read_world().space)
    }

    /// Modifications waiting for the next update.
    pub fn pending_modifications(&self) -> usize {
        self.queue.len()
    }

    // ── Locks ─────────────────────────────────────────────────────────────

    fn read_world(&self) -> RwLockReadGuard<'_, World> {
        self.world.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write_world(&self) -> RwLockWriteGuard<'_, World> {
        self.world.write().unwrap_or_else(|p| p.into_inner())
    }

    fn lock_observers(&self) -> MutexGuard<'_, Vec<Box<dyn SimObserver>>> {
        self.observers.lock().unwrap_or_else(|p| p.into_inner())
    }
}

// ── Agent tasks ───────────────────────────────────────────────────────────────

/// Execute one agent, turning errors, panics and overruns into `SimError`.
fn run_task(
    handle: &AgentHandle,
    space:  &PointSpace,
    sink:   &dyn ModificationSink,
    seed:   u64,
    tick:   Tick,
    limit:  Option<Duration>,
) -> SimResult<()> {
    let ctx = StepContext::new(tick, handle, space, sink);
    let agent = ctx.agent;
    let mut rng = AgentRng::for_step(seed, agent, tick);

    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| handle.agent().execute(&ctx, &mut rng)));
    let elapsed = started.elapsed();

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(source)) => {
            error!(%agent, %tick, %source, "agent task failed");
            return Err(SimError::AgentTaskFailure { agent, tick, source });
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(%agent, %tick, %message, "agent task panicked");
            return Err(SimError::AgentTaskPanic { agent, tick, message });
        }
    }

    match limit {
        Some(limit) if elapsed > limit => {
            error!(%agent, %tick, elapsed_ms = elapsed.as_millis() as u64, "agent task timed out");
            Err(SimError::AgentTaskTimeout {
                agent,
                tick,
                elapsed_ms: elapsed.as_millis() as u64,
                limit_ms:   limit.as_millis() as u64,
            })
        }
        _ => Ok(()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
