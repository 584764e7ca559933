use thiserror::Error;

use crate::Phase;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("{operation} is not allowed during the {phase} phase")]
    PhaseViolation { operation: &'static str, phase: Phase },
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
