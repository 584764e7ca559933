//! `abm-core`: foundational types for the `rust_abm` individual-based
//! simulation framework.
//!
//! This crate is a dependency of every other `abm-*` crate.  It intentionally
//! has no `abm-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AgentId`                                             |
//! | [`geo`]         | `Point`, `Motion`                                     |
//! | [`time`]        | `Tick`                                                |
//! | [`config`]      | `SimConfig`                                           |
//! | [`rng`]         | `AgentRng` (per agent, per tick), `SimRng` (scenario) |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::SimConfig;
pub use error::{CoreError, CoreResult};
pub use geo::{Motion, Point};
pub use ids::AgentId;
pub use rng::{AgentRng, SimRng};
pub use time::Tick;
