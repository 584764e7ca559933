use abm_agent::{AgentError, EnvironmentId};
use abm_core::{AgentId, CoreError, Tick};
use abm_schedule::ScheduleError;
use abm_spatial::SpatialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("spatial error: {0}")]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("scenario setup failed: {0}")]
    Setup(String),

    #[error("agent handle is already active in {0}")]
    AlreadyActive(EnvironmentId),

    #[error("agent {agent} failed at tick {tick}: {source}")]
    AgentTaskFailure {
        agent:  AgentId,
        tick:   Tick,
        source: AgentError,
    },

    #[error("agent {agent} panicked at tick {tick}: {message}")]
    AgentTaskPanic {
        agent:   AgentId,
        tick:    Tick,
        message: String,
    },

    #[error("agent {agent} ran {elapsed_ms} ms at tick {tick}, limit is {limit_ms} ms")]
    AgentTaskTimeout {
        agent:      AgentId,
        tick:       Tick,
        elapsed_ms: u64,
        limit_ms:   u64,
    },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

impl SimError {
    /// The agent whose task failed the step, if the error came from one.
    pub fn failed_agent(&self) -> Option<AgentId> {
        match self {
            SimError::AgentTaskFailure { agent, .. }
            | SimError::AgentTaskPanic { agent, .. }
            | SimError::AgentTaskTimeout { agent, .. } => Some(*agent),
            _ => None,
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
