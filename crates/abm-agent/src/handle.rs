//! Shared agent handles and their activation lifecycle.
//!
//! # Lifecycle
//!
//! ```text
//! AgentHandle::new ──► inactive ──activate(env, id)──► active in env
//!                          ▲                               │
//!                          └──────── deactivate(env) ◄─────┘
//! ```
//!
//! A handle is created inactive and without an id.  An environment activates
//! it during its update phase, assigning an `AgentId` and claiming the
//! handle.  The claim is a compare-and-set on the owning environment, so a
//! handle can never be active in two environments at once.
//!
//! The active flag can also be cleared by the agent itself
//! ([`AgentHandle::retire`]); the environment sweeps such agents at the start
//! of its next update.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use abm_core::AgentId;

use crate::Agent;

// ── EnvironmentId ─────────────────────────────────────────────────────────────

/// Process-unique identity of an environment.  Never zero.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct EnvironmentId(u64);

/// Zero marks "no environment" inside a handle.
const NO_ENVIRONMENT: u64 = 0;

static NEXT_ENVIRONMENT: AtomicU64 = AtomicU64::new(1);

impl EnvironmentId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        EnvironmentId(NEXT_ENVIRONMENT.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Env({})", self.0)
    }
}

// ── AgentHandle ───────────────────────────────────────────────────────────────

struct Shared {
    agent:       Box<dyn Agent>,
    id:          AtomicU32,
    environment: AtomicU64,
    active:      AtomicBool,
}

/// Cheaply clonable reference to an agent plus its lifecycle state.
///
/// Clones refer to the same agent; equality is identity.
#[derive(Clone)]
pub struct AgentHandle(Arc<Shared>);

impl AgentHandle {
    /// Wrap `agent` in a new, inactive handle.
    pub fn new<A: Agent>(agent: A) -> Self {
        AgentHandle(Arc::new(Shared {
            agent:       Box::new(agent),
            id:          AtomicU32::new(AgentId::INVALID.0),
            environment: AtomicU64::new(NO_ENVIRONMENT),
            active:      AtomicBool::new(false),
        }))
    }

    #[inline]
    pub fn agent(&self) -> &dyn Agent {
        self.0.agent.as_ref()
    }

    /// The id assigned at the most recent activation, or `None` if the handle
    /// was never activated.
    pub fn id(&self) -> Option<AgentId> {
        let id = AgentId(self.0.id.load(Ordering::Acquire));
        id.is_valid().then_some(id)
    }

    /// The environment currently owning this handle.
    pub fn environment(&self) -> Option<EnvironmentId> {
        match self.0.environment.load(Ordering::Acquire) {
            NO_ENVIRONMENT => None,
            raw => Some(EnvironmentId(raw)),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.0.active.load(Ordering::Acquire)
    }

    /// Clear the active flag.  The owning environment removes the agent at
    /// the start of its next update.
    pub fn retire(&self) {
        self.0.active.store(false, Ordering::Release);
    }

    #[inline]
    pub fn ptr_eq(&self, other: &AgentHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    // ── Environment side ──────────────────────────────────────────────────

    /// Claim the handle for `env` and assign `id`.
    ///
    /// Fails with the current owner if the handle is already claimed.
    /// Called by the environment during its update phase.
    pub fn activate(&self, env: EnvironmentId, id: AgentId) -> Result<(), EnvironmentId> {
        self.0
            .environment
            .compare_exchange(NO_ENVIRONMENT, env.0, Ordering::AcqRel, Ordering::Acquire)
            .map_err(EnvironmentId)?;
        self.0.id.store(id.0, Ordering::Release);
        self.0.active.store(true, Ordering::Release);
        Ok(())
    }

    /// Release the handle from `env`.  Returns `false` if `env` did not own
    /// it.  The last id stays readable for logging.
    pub fn deactivate(&self, env: EnvironmentId) -> bool {
        let released = self
            .0
            .environment
            .compare_exchange(env.0, NO_ENVIRONMENT, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if released {
            self.0.active.store(false, Ordering::Release);
        }
        released
    }
}

impl PartialEq for AgentHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for AgentHandle {}

impl fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentHandle")
            .field("id", &self.id())
            .field("environment", &self.environment())
            .field("active", &self.is_active())
            .finish()
    }
}
