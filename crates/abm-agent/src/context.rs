//! Per-task view of the world passed to every `Agent::execute` call.

use abm_core::{AgentId, Motion, Point, Tick};
use abm_spatial::{DistantObject, PointSpace, SpatialResult};

use crate::{AgentHandle, Message, ModificationSink};

/// What one agent sees and may request during one tick.
///
/// The point space is borrowed immutably for the whole execution phase; no
/// agent can observe another agent's edits before the next update.  Edits go
/// to the [`ModificationSink`] and are applied in the next update phase.
pub struct StepContext<'a> {
    /// The tick being executed.
    pub tick: Tick,

    /// Id of the executing agent.
    pub agent: AgentId,

    /// Read-only point space shared by all tasks of this tick.
    pub space: &'a PointSpace,

    handle: &'a AgentHandle,
    sink:   &'a dyn ModificationSink,
}

impl<'a> StepContext<'a> {
    #[inline]
    pub fn new(
        tick:   Tick,
        handle: &'a AgentHandle,
        space:  &'a PointSpace,
        sink:   &'a dyn ModificationSink,
    ) -> Self {
        let agent = handle.id().unwrap_or_default();
        Self { tick, agent, space, handle, sink }
    }

    #[inline]
    pub fn handle(&self) -> &AgentHandle {
        self.handle
    }

    #[inline]
    pub fn sink(&self) -> &dyn ModificationSink {
        self.sink
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    pub fn position(&self) -> SpatialResult<Point> {
        self.space.position_of(self.agent)
    }

    /// Other agents within `radius`, nearest first.
    pub fn neighbors(&self, radius: f64) -> SpatialResult<Vec<DistantObject>> {
        self.space.visible_neighbors(self.agent, radius)
    }

    /// The `k` other agents closest to this one, nearest first.
    pub fn nearest(&self, k: usize) -> SpatialResult<Vec<DistantObject>> {
        let here = self.position()?;
        let mut hits = self.space.nearest_neighbors(here, k.saturating_add(1));
        hits.retain(|hit| hit.id != self.agent);
        hits.truncate(k);
        Ok(hits)
    }

    // ── Deferred writes ───────────────────────────────────────────────────

    /// Move this agent by `motion` in the next update.
    pub fn move_by(&self, motion: Motion) {
        self.sink.enqueue_movement(self.handle.clone(), motion);
    }

    /// Add `agent` at `at` in the next update.
    pub fn spawn(&self, agent: AgentHandle, at: Point) {
        self.sink.enqueue_activation(agent, at);
    }

    /// Remove this agent in the next update.
    pub fn remove_self(&self) {
        self.sink.enqueue_deactivation(self.handle.clone());
    }

    /// Send `payload` from this agent to `to`.
    pub fn send(&self, to: Vec<AgentId>, payload: Vec<u8>) {
        self.sink.enqueue_message(Message::new(Some(self.agent), to, payload));
    }

    /// Clear this agent's active flag; it is swept at the start of the next
    /// update.
    pub fn retire(&self) {
        self.handle.retire();
    }
}
