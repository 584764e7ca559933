//! walled_room: random walkers in a room split by a wall with one door.
//!
//! Walkers start in the left half, take a random step every tick, greet
//! their nearest neighbor, and occasionally reproduce or die.  The wall
//! between the halves has a single open tile, so the right half fills up
//! slowly through the door.
//!
//! Configuration is TOML (see `walled_room.toml`); pass a path as the first
//! argument to override the built-in scenario.  Set `RUST_LOG=debug` to see
//! per-phase logging from the environment.

use std::f64::consts::TAU;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use abm_agent::{Agent, AgentHandle, AgentResult, Message, StepContext};
use abm_core::{AgentRng, Motion, Point, SimConfig, SimRng};
use abm_sim::{EnvironmentBuilder, StepReport, TracingObserver};
use abm_spatial::{Direction, TileCoord, TileGrid};

const DEFAULT_CONFIG: &str = include_str!("../walled_room.toml");

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct DemoConfig {
    #[serde(default)]
    sim:        SimConfig,
    room:       RoomConfig,
    population: PopulationConfig,
}

#[derive(Debug, Deserialize)]
struct RoomConfig {
    width:    u32,
    height:   u32,
    door_row: u32,
}

#[derive(Debug, Deserialize)]
struct PopulationConfig {
    walkers:           usize,
    max_population:    usize,
    ticks:             u64,
    step_length:       f64,
    greeting_radius:   f64,
    spawn_probability: f64,
    death_probability: f64,
}

fn load_config() -> Result<DemoConfig> {
    let text = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {path}"))?,
        None => DEFAULT_CONFIG.to_owned(),
    };
    let config: DemoConfig = toml::from_str(&text).context("parsing config")?;
    ensure!(config.room.width >= 2, "room must be at least 2 tiles wide");
    ensure!(config.room.door_row < config.room.height, "door_row is outside the room");
    Ok(config)
}

// ── Room ──────────────────────────────────────────────────────────────────────

/// Open room with a full-height wall down the middle, except at `door_row`.
fn build_room(room: &RoomConfig) -> Result<TileGrid> {
    let mut grid = TileGrid::new(room.width, room.height)?;
    let left_of_wall = room.width / 2 - 1;
    for row in (0..room.height).filter(|&r| r != room.door_row) {
        grid.set_barrier(TileCoord::new(left_of_wall, row), Direction::East, true)?;
    }
    Ok(grid)
}

// ── Walker ────────────────────────────────────────────────────────────────────

struct Walker {
    params:    Arc<PopulationConfig>,
    greetings: Arc<AtomicUsize>,
}

impl Walker {
    fn offspring(&self) -> Walker {
        Walker {
            params:    Arc::clone(&self.params),
            greetings: Arc::clone(&self.greetings),
        }
    }
}

impl Agent for Walker {
    fn execute(&self, ctx: &StepContext<'_>, rng: &mut AgentRng) -> AgentResult<()> {
        let p = &self.params;

        let heading = rng.gen_range(0.0..TAU);
        ctx.move_by(Motion::polar(heading, p.step_length));

        if let Some(nearest) = ctx.neighbors(p.greeting_radius)?.first() {
            ctx.send(vec![nearest.id], b"hello".to_vec());
        }

        if ctx.space.len() < p.max_population && rng.gen_bool(p.spawn_probability) {
            ctx.spawn(AgentHandle::new(self.offspring()), ctx.position()?);
        }
        if rng.gen_bool(p.death_probability) {
            ctx.remove_self();
        }
        Ok(())
    }

    fn receive(&self, _message: &Message) {
        self.greetings.fetch_add(1, Ordering::Relaxed);
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = load_config()?;
    let room = &config.room;
    let mid = room.width / 2;

    println!("=== walled_room: rust_abm ===");
    println!(
        "Room: {}×{} (door at row {})  |  Walkers: {}  |  Ticks: {}  |  Seed: {}",
        room.width, room.height, room.door_row,
        config.population.walkers, config.population.ticks, config.sim.seed,
    );
    println!();

    // 1. Place the initial walkers in the left half.
    let params = Arc::new(config.population);
    let greetings = Arc::new(AtomicUsize::new(0));
    let mut setup_rng = SimRng::new(config.sim.seed);
    let walkers = (0..params.walkers).map(|_| {
        let col = setup_rng.gen_range(0..mid);
        let row = setup_rng.gen_range(0..room.height);
        let at = Point::new(
            col as f64 + setup_rng.gen_range(0.1..0.9),
            row as f64 + setup_rng.gen_range(0.1..0.9),
        );
        let walker = Walker { params: Arc::clone(&params), greetings: Arc::clone(&greetings) };
        (AgentHandle::new(walker), at)
    });

    // 2. Build the environment.
    let env = EnvironmentBuilder::new(build_room(room)?)
        .config(config.sim.clone())
        .agents(walkers.collect::<Vec<_>>())
        .observer(TracingObserver)
        .build()?;
    println!("Worker threads: {}", env.config().worker_threads());

    // 3. Run.
    let t0 = Instant::now();
    let mut totals = StepReport::default();
    for _ in 0..params.ticks {
        let report = env.next_step()?;
        totals.activated   += report.activated;
        totals.deactivated += report.deactivated;
        totals.moved       += report.moved;
        totals.delivered   += report.delivered;
        totals.rejected    += report.rejected;
        totals.tick         = report.tick;
        if report.tick.0 % 50 == 0 {
            println!("{report}");
        }
    }
    let elapsed = t0.elapsed();

    // 4. Summary.
    let (left, right) = env.with_space(|space| {
        space.iter().fold((0usize, 0usize), |(l, r), (_, p)| {
            if p.x < mid as f64 { (l + 1, r) } else { (l, r + 1) }
        })
    });
    println!();
    println!("Simulation complete in {:.3} s ({})", elapsed.as_secs_f64(), totals.tick);
    println!("  births     : {}", totals.activated);
    println!("  deaths     : {}", totals.deactivated);
    println!("  moves      : {}", totals.moved);
    println!("  greetings  : {}", greetings.load(Ordering::Relaxed));
    println!("  rejected   : {}", totals.rejected);
    println!();
    println!("{:<8} {:>8}", "Side", "Walkers");
    println!("{}", "-".repeat(17));
    println!("{:<8} {:>8}", "left", left);
    println!("{:<8} {:>8}", "right", right);

    Ok(())
}
