//! A no-op agent: occupies space, never acts.

use abm_core::AgentRng;

use crate::{Agent, AgentResult, StepContext};

/// An [`Agent`] whose `execute` does nothing.
///
/// Useful as a placeholder in tests or for passive obstacles that simply
/// occupy a point.
pub struct NoopAgent;

impl Agent for NoopAgent {
    fn execute(&self, _ctx: &StepContext<'_>, _rng: &mut AgentRng) -> AgentResult<()> {
        Ok(())
    }
}
