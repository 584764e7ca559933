//! Deterministic per-agent and scenario-level RNG wrappers.
//!
//! # Determinism strategy
//!
//! There is no process-wide RNG.  Each agent task receives a fresh `SmallRng`
//! seeded by:
//!
//!   seed = global_seed XOR (agent_id * MIXING_CONSTANT) XOR (tick * TICK_MIX)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive agent IDs uniformly across the seed space.
//! This means:
//!
//! - Agents never share RNG state (no contention, no ordering dependency).
//! - A run is reproducible no matter how the worker pool schedules tasks.
//! - Nothing has to be stored between ticks.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::{AgentId, Tick};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Second odd constant so that `(agent, tick)` and `(tick, agent)` differ.
const TICK_MIX: u64 = 0xbf58_476d_1ce4_e5b9;

// ── AgentRng ──────────────────────────────────────────────────────────────────

/// Per-agent, per-tick deterministic RNG.
///
/// Built by the environment right before an agent executes and dropped when
/// the task ends, so it is never shared across threads.
pub struct AgentRng(SmallRng);

impl AgentRng {
    /// Seed deterministically from the run's global seed, an agent ID and
    /// the tick being executed.
    pub fn for_step(global_seed: u64, agent: AgentId, tick: Tick) -> Self {
        let seed = global_seed
            ^ (agent.0 as u64).wrapping_mul(MIXING_CONSTANT)
            ^ tick.0.wrapping_add(1).wrapping_mul(TICK_MIX);
        AgentRng(SmallRng::seed_from_u64(seed))
    }

    /// Expose the inner `SmallRng` for use with `rand` distribution types.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Sample a uniformly distributed value of any `Standard`-distributed type.
    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// Scenario-level RNG for setup work (initial placement, wall layouts).
///
/// Used only in single-threaded contexts before the first step.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }
}
