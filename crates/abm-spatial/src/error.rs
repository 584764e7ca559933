//! Spatial-subsystem error type.

use thiserror::Error;

use abm_core::AgentId;

/// Errors produced by `abm-spatial`.
///
/// All of them are caller contract violations; the index never recovers from
/// them on its own.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpatialError {
    #[error("({x}, {y}) lies outside the {width}x{height} grid")]
    OutOfBounds { x: f64, y: f64, width: u32, height: u32 },

    #[error("grid dimensions {width}x{height} are invalid")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("expected {expected} wall masks, got {got}")]
    WallMaskCount { expected: usize, got: usize },

    #[error("{0} is not in the space")]
    NotFound(AgentId),

    #[error("{0} is already in the space")]
    DuplicateInsertion(AgentId),

    #[error("coordinates must be finite")]
    NonFinite,
}

pub type SpatialResult<T> = Result<T, SpatialError>;
