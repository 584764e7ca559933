//! `Modification`: one pending world edit.

use abm_agent::{AgentHandle, Message};
use abm_core::{Motion, Point};

/// A deferred edit, applied exactly once during the next update phase.
#[derive(Debug, Clone)]
pub enum Modification {
    /// Activate the agent at the given point: assign an id and insert it into
    /// the agent collection and the point space.
    Activation(AgentHandle, Point),

    /// Remove the agent from the agent collection and the point space.
    Deactivation(AgentHandle),

    /// Move the agent by a motion, clipped at walls and the grid border.
    Movement(AgentHandle, Motion),

    /// Hand the message to each declared recipient's `receive`.
    MessageDelivery(Message),
}

impl Modification {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Modification::Activation(..)      => "activation",
            Modification::Deactivation(..)    => "deactivation",
            Modification::Movement(..)        => "movement",
            Modification::MessageDelivery(..) => "message",
        }
    }

    /// The agent the edit targets, if any.
    pub fn agent(&self) -> Option<&AgentHandle> {
        match self {
            Modification::Activation(agent, _)
            | Modification::Deactivation(agent)
            | Modification::Movement(agent, _) => Some(agent),
            Modification::MessageDelivery(_) => None,
        }
    }
}
