use abm_spatial::SpatialError;
use thiserror::Error;

/// Error returned from [`Agent::execute`][crate::Agent::execute].
///
/// Any error fails the whole step it was raised in.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AgentError {
    #[error("agent failed: {0}")]
    Failed(String),

    #[error("spatial query failed: {0}")]
    Spatial(#[from] SpatialError),
}

impl AgentError {
    pub fn failed(reason: impl Into<String>) -> Self {
        AgentError::Failed(reason.into())
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
