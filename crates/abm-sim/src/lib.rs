//! `abm-sim`: the step scheduler for the rust_abm framework.
//!
//! # Step cycle
//!
//! ```text
//! next_step():
//!   ① Update     Idle → Update.  Drain the modification queue in FIFO order
//!                (activate / deactivate / move / deliver), then sweep agents
//!                whose active flag was cleared.  Publish lifecycle events.
//!   ② Execution  Update → Execution.  Run Agent::execute once per active
//!                agent on the worker pool; the point space is read-only and
//!                every write goes back into the queue.
//!   ③ Advance    time += 1, publish TimeAdvanced.
//!   ④ Idle       Execution → Idle.
//! ```
//!
//! A failed, panicking or overrunning agent task aborts the step with an
//! error and leaves time unchanged.  Whatever other agents already queued is
//! applied by the next successful step.
//!
//! # Crate layout
//!
//! | Module          | Contents                                               |
//! |-----------------|--------------------------------------------------------|
//! | [`environment`] | `Environment`: `next_step`, producers, reads          |
//! | [`builder`]     | `EnvironmentBuilder`                                   |
//! | [`observer`]    | `SimObserver`, `SimEvent`, `NoopObserver`, `TracingObserver`, `EventLog` |
//! | [`report`]      | `StepReport`                                           |
//! | [`error`]       | `SimError`, `SimResult<T>`                             |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use abm_agent::{AgentHandle, NoopAgent};
//! use abm_core::{Point, SimConfig};
//! use abm_sim::{EnvironmentBuilder, TracingObserver};
//! use abm_spatial::TileGrid;
//!
//! let env = EnvironmentBuilder::new(TileGrid::new(10, 10)?)
//!     .config(SimConfig::default())
//!     .agent(AgentHandle::new(NoopAgent), Point::new(0.5, 0.5))
//!     .observer(TracingObserver)
//!     .build()?;
//! let report = env.next_step()?;
//! ```

pub mod builder;
pub mod environment;
pub mod error;
pub mod observer;
pub mod report;

mod world;


pub use builder::EnvironmentBuilder;
pub use environment::Environment;
pub use error::{SimError, SimResult};
pub use observer::{EventLog, NoopObserver, SimEvent, SimObserver, TracingObserver};
pub use report::StepReport;
