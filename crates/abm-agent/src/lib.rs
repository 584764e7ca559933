//! `abm-agent`: the agent execution contract and everything an agent sees
//! while it runs.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                        |
//! |-------------|-----------------------------------------------------------------|
//! | [`model`]   | `Agent` trait (`execute`, `receive`)                            |
//! | [`handle`]  | `AgentHandle`: shared, lifecycle-tracking reference to an agent |
//! | [`context`] | `StepContext<'a>`: read-only tick view plus deferred edits      |
//! | [`sink`]    | `ModificationSink` trait: where deferred edits go               |
//! | [`message`] | `Message`                                                        |
//! | [`noop`]    | `NoopAgent`: placeholder that never does anything               |
//! | [`error`]   | `AgentError`, `AgentResult<T>`                                   |
//!
//! # Design notes
//!
//! An environment advances in two halves per tick:
//!
//! 1. **Update** (single thread): queued modifications are applied to the
//!    point space and the agent collection.
//!
//! 2. **Execution** (worker pool): `Agent::execute` runs once per active
//!    agent.  All reads go through `&StepContext`; every write is a request
//!    pushed into a [`ModificationSink`] and applied in the next update.
//!
//! This split means `Agent` only needs to be `Send + Sync`, and every agent
//! in a tick observes the same world.

pub mod context;
pub mod error;
pub mod handle;
pub mod message;
pub mod model;
pub mod noop;
pub mod sink;

#[cfg(test)]
mod tests;

pub use context::StepContext;
pub use error::{AgentError, AgentResult};
pub use handle::{AgentHandle, EnvironmentId};
pub use message::Message;
pub use model::Agent;
pub use noop::NoopAgent;
pub use sink::ModificationSink;
