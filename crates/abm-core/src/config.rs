//! Environment configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::{CoreError, CoreResult};

/// Top-level environment configuration.
///
/// Typically loaded from a TOML file by the application crate and passed to
/// the environment builder.  Every field has a default so a partial document
/// is enough.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Master RNG seed.  The same seed always produces identical agent RNG
    /// streams, regardless of how tasks are spread over worker threads.
    pub seed: u64,

    /// Worker thread count for the execution phase.  `None` uses the
    /// available parallelism of the host.
    pub num_threads: Option<usize>,

    /// Soft per-task limit in milliseconds.  A task that runs longer fails
    /// the step once it returns; tasks are never preempted.
    pub task_timeout_ms: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed:            0,
            num_threads:     None,
            task_timeout_ms: None,
        }
    }
}

impl SimConfig {
    /// Check the configuration without building anything from it.
    pub fn validate(&self) -> CoreResult<()> {
        if self.num_threads == Some(0) {
            return Err(CoreError::Config("num_threads must be at least 1".into()));
        }
        if self.task_timeout_ms == Some(0) {
            return Err(CoreError::Config("task_timeout_ms must be at least 1".into()));
        }
        Ok(())
    }

    /// Resolved worker thread count.
    pub fn worker_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_ms.map(Duration::from_millis)
    }
}
