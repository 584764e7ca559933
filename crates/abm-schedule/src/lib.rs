//! `abm-schedule`: the deferred modification queue and the step phase
//! machine.
//!
//! # Crate layout
//!
//! | Module           | Contents                                               |
//! |------------------|--------------------------------------------------------|
//! | [`modification`] | `Modification` (Activation, Deactivation, Movement, MessageDelivery) |
//! | [`queue`]        | `ModificationQueue`, `DrainSummary`                    |
//! | [`phase`]        | `Phase`, `PhaseCell` (atomic compare-and-set cycle)    |
//! | [`error`]        | `ScheduleError`, `ScheduleResult<T>`                   |
//!
//! # Tick model (summary)
//!
//! ```text
//! Idle ──► Update ──► Execution ──► Idle
//!           │            │
//!           │            └─ agent tasks enqueue Modifications (many producers)
//!           └─ scheduler drains and applies them in FIFO order (one consumer)
//! ```
//!
//! Everything an agent wants to change is a `Modification`.  The queue is the
//! only channel through which the world is mutated across threads.

pub mod error;
pub mod modification;
pub mod phase;
pub mod queue;


pub use error::{ScheduleError, ScheduleResult};
pub use modification::Modification;
pub use phase::{Phase, PhaseCell};
pub use queue::{DrainSummary, ModificationQueue};
