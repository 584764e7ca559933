//! The mutable half of an environment: the point space plus the live agent
//! collection.  Only touched under the environment's write lock during the
//! update phase (and by the builder before the first step).

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use abm_agent::{AgentHandle, EnvironmentId, Message};
use abm_core::{AgentId, Motion, Point, Tick};
use abm_schedule::Modification;
use abm_spatial::{PointSpace, SpatialError};
use thiserror::Error;
use tracing::{error, warn};

use crate::{SimError, SimEvent, StepReport};

/// Why a queued modification was skipped.
#[derive(Debug, Error)]
pub(crate) enum Rejection {
    #[error("agent is already active in {0}")]
    AlreadyActive(EnvironmentId),

    #[error("agent is not part of this environment")]
    NotMember,

    #[error("agent id space is exhausted")]
    IdsExhausted,

    #[error("no recipient was active")]
    NoRecipients,

    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

impl From<Rejection> for SimError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::AlreadyActive(owner) => SimError::AlreadyActive(owner),
            Rejection::Spatial(e)           => SimError::Spatial(e),
            other                           => SimError::Setup(other.to_string()),
        }
    }
}

pub(crate) struct World {
    pub(crate) space: PointSpace,
    pub(crate) agents: BTreeMap<AgentId, AgentHandle>,
    next_id: u32,
}

impl World {
    pub(crate) fn new(space: PointSpace) -> Self {
        World { space, agents: BTreeMap::new(), next_id: 0 }
    }

    // ── Membership ────────────────────────────────────────────────────────

    /// Assign the next id to `handle`, claim it for `env` and place it at `at`.
    pub(crate) fn activate(
        &mut self,
        env:    EnvironmentId,
        handle: &AgentHandle,
        at:     Point,
    ) -> Result<AgentId, Rejection> {
        if let Some(owner) = handle.environment() {
            return Err(Rejection::AlreadyActive(owner));
        }
        if !at.is_finite() {
            return Err(SpatialError::NonFinite.into());
        }
        if !self.space.grid().contains(at) {
            let (width, height) = self.space.grid().size();
            return Err(SpatialError::OutOfBounds { x: at.x, y: at.y, width, height }.into());
        }
        let id = AgentId(self.next_id);
        if !id.is_valid() {
            return Err(Rejection::IdsExhausted);
        }

        handle.activate(env, id).map_err(Rejection::AlreadyActive)?;
        if let Err(e) = self.space.insert(id, at) {
            handle.deactivate(env);
            return Err(e.into());
        }
        self.agents.insert(id, handle.clone());
        self.next_id += 1;
        Ok(id)
    }

    /// Remove `handle` from the collection and the space and release it.
    pub(crate) fn deactivate(
        &mut self,
        env:    EnvironmentId,
        handle: &AgentHandle,
    ) -> Result<AgentId, Rejection> {
        let id = self.member_id(env, handle)?;
        self.agents.remove(&id);
        self.space.remove(id);
        handle.deactivate(env);
        Ok(id)
    }

    fn member_id(&self, env: EnvironmentId, handle: &AgentHandle) -> Result<AgentId, Rejection> {
        if handle.environment() != Some(env) {
            return Err(Rejection::NotMember);
        }
        match handle.id() {
            Some(id) if self.agents.get(&id).is_some_and(|h| h.ptr_eq(handle)) => Ok(id),
            _ => Err(Rejection::NotMember),
        }
    }

    /// Remove every agent whose active flag has been cleared.
    pub(crate) fn sweep_retired(&mut self, env: EnvironmentId) -> Vec<AgentId> {
        let retired: Vec<AgentId> = self
            .agents
            .iter()
            .filter(|(_, handle)| !handle.is_active())
            .map(|(&id, _)| id)
            .collect();
        for &id in &retired {
            if let Some(handle) = self.agents.remove(&id) {
                self.space.remove(id);
                handle.deactivate(env);
            }
        }
        retired
    }

    /// Active handles in id order.
    pub(crate) fn snapshot(&self) -> Vec<AgentHandle> {
        self.agents.values().filter(|h| h.is_active()).cloned().collect()
    }

    // ── Modifications ─────────────────────────────────────────────────────

    /// Apply one queued modification, updating `report` and `events`.
    /// Returns `false` if it was rejected.
    pub(crate) fn apply(
        &mut self,
        env:          EnvironmentId,
        modification: Modification,
        tick:         Tick,
        report:       &mut StepReport,
        events:       &mut Vec<SimEvent>,
    ) -> bool {
        let kind = modification.kind();
        let outcome = match modification {
            Modification::Activation(handle, at) => {
                self.activate(env, &handle, at).map(|agent| {
                    report.activated += 1;
                    events.push(SimEvent::AgentActivated { agent, at, tick });
                })
            }
            Modification::Deactivation(handle) => self.deactivate(env, &handle).map(|agent| {
                report.deactivated += 1;
                events.push(SimEvent::AgentDeactivated { agent, tick });
            }),
            Modification::Movement(handle, motion) => {
                self.move_agent(env, &handle, motion).map(|_| report.moved += 1)
            }
            Modification::MessageDelivery(message) => self.deliver(&message, report),
        };
        match outcome {
            Ok(()) => true,
            Err(reason) => {
                warn!(%tick, kind, %reason, "modification rejected");
                false
            }
        }
    }

    fn move_agent(
        &mut self,
        env:    EnvironmentId,
        handle: &AgentHandle,
        motion: Motion,
    ) -> Result<Point, Rejection> {
        let id = self.member_id(env, handle)?;
        Ok(self.space.move_object(id, motion)?)
    }

    /// Hand `message` to every active recipient.  Rejected only if nobody
    /// received it.
    fn deliver(&self, message: &Message, report: &mut StepReport) -> Result<(), Rejection> {
        let mut reached = 0;
        for &recipient in &message.to {
            let Some(handle) = self.agents.get(&recipient).filter(|h| h.is_active()) else {
                report.undelivered += 1;
                continue;
            };
            let received =
                panic::catch_unwind(AssertUnwindSafe(|| handle.agent().receive(message)));
            if received.is_ok() {
                reached += 1;
            } else {
                error!(agent = %recipient, "message handler panicked");
                report.undelivered += 1;
            }
        }
        report.delivered += reached;
        if reached == 0 && !message.to.is_empty() {
            return Err(Rejection::NoRecipients);
        }
        Ok(())
    }
}
