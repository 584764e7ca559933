//! Fluent builder for constructing an [`Environment`].

use std::sync::atomic::AtomicU64;
use std::sync::{Mutex, RwLock};

use abm_agent::{AgentHandle, EnvironmentId};
use abm_core::{Point, SimConfig};
use abm_schedule::{ModificationQueue, PhaseCell};
use abm_spatial::{PointSpace, TileGrid};
use tracing::debug;

use crate::world::World;
use crate::{Environment, SimError, SimObserver, SimResult};

/// Fluent builder for [`Environment`].
///
/// # Required inputs
///
/// - [`TileGrid`]: size and walls; walls are fixed once the environment
///   is built.
///
/// # Optional inputs (have defaults)
///
/// | Method                  | Default                      |
/// |-------------------------|------------------------------|
/// | `.config(c)`            | `SimConfig::default()`       |
/// | `.agent(h, p)`          | No initial agents            |
/// | `.observer(o)`          | No observers                 |
///
/// Initial agents are placed directly, before the first step, and receive
/// ids `0, 1, 2, …` in the order they were added.  No activation events are
/// published for them.
///
/// # Example
///
/// ```rust,ignore
/// let env = EnvironmentBuilder::new(TileGrid::new(20, 20)?)
///     .config(SimConfig { seed: 7, ..SimConfig::default() })
///     .agent(AgentHandle::new(Walker), Point::new(0.5, 0.5))
///     .observer(TracingObserver)
///     .build()?;
/// env.run_ticks(100)?;
/// ```
pub struct EnvironmentBuilder {
    grid:      TileGrid,
    config:    SimConfig,
    agents:    Vec<(AgentHandle, Point)>,
    observers: Vec<Box<dyn SimObserver>>,
}

impl EnvironmentBuilder {
    pub fn new(grid: TileGrid) -> Self {
        Self {
            grid,
            config:    SimConfig::default(),
            agents:    Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    /// Place `handle` at `at` before the first step.
    pub fn agent(mut self, handle: AgentHandle, at: Point) -> Self {
        self.agents.push((handle, at));
        self
    }

    pub fn agents(mut self, agents: impl IntoIterator<Item = (AgentHandle, Point)>) -> Self {
        self.agents.extend(agents);
        self
    }

    pub fn observer(mut self, observer: impl SimObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Validate the configuration, start the worker pool, place the initial
    /// agents and return an idle [`Environment`] at tick 0.
    pub fn build(self) -> SimResult<Environment> {
        self.config.validate()?;

        let threads = self.config.worker_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("abm-worker-{i}"))
            .build()
            .map_err(|e| SimError::ThreadPool(e.to_string()))?;

        let id = EnvironmentId::next();
        let mut world = World::new(PointSpace::new(self.grid));
        for (handle, at) in &self.agents {
            if let Err(rejection) = world.activate(id, handle, *at) {
                for placed in world.agents.values() {
                    placed.deactivate(id);
                }
                return Err(rejection.into());
            }
        }
        debug!(env = %id, threads, agents = self.agents.len(), "environment built");

        Ok(Environment {
            id,
            config:    self.config,
            phase:     PhaseCell::new(),
            time:      AtomicU64::new(0),
            step_lock: Mutex::new(()),
            world:     RwLock::new(world),
            queue:     ModificationQueue::new(),
            pool,
            observers: Mutex::new(self.observers),
        })
    }
}

impl Environment {
    /// An environment over `grid` with `config` and no initial agents.
    pub fn new(grid: TileGrid, config: SimConfig) -> SimResult<Self> {
        EnvironmentBuilder::new(grid).config(config).build()
    }
}
