//! The `Agent` trait: the main extension point for user code.

use abm_core::AgentRng;

use crate::{AgentResult, Message, StepContext};

/// Pluggable agent behavior.
///
/// Implement this trait to define what an agent does each tick.  `execute`
/// receives a read-only [`StepContext`] and an [`AgentRng`] seeded from the
/// run seed, the agent's id and the tick, so behavior is deterministic
/// regardless of thread ordering.
///
/// # Thread safety
///
/// The environment calls `execute` for many agents in parallel, so
/// implementations must be `Send + Sync`.  Per-agent mutable state belongs
/// behind interior mutability (`Mutex`, atomics) inside the implementor.
///
/// # Example
///
/// ```rust,ignore
/// struct Drifter;
///
/// impl Agent for Drifter {
///     fn execute(&self, ctx: &StepContext<'_>, rng: &mut AgentRng) -> AgentResult<()> {
///         let heading = rng.gen_range(0.0..std::f64::consts::TAU);
///         ctx.move_by(Motion::polar(heading, 0.25));
///         Ok(())
///     }
/// }
/// ```
pub trait Agent: Send + Sync + 'static {
    /// Called once per tick while the agent is active.
    ///
    /// Must not call back into the environment's step; world changes go
    /// through the context's deferred operations.
    fn execute(&self, ctx: &StepContext<'_>, rng: &mut AgentRng) -> AgentResult<()>;

    /// Called during the update phase when a message addressed to this agent
    /// is delivered.  Runs on the scheduler thread.
    ///
    /// Default: the message is ignored.
    fn receive(&self, _message: &Message) {}
}
