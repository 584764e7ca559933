//! Agent-to-agent messages.

use abm_core::AgentId;

/// A message routed by the environment during its update phase.
///
/// The payload is opaque to the framework; agents agree on its encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Sender, or `None` for messages injected from outside the simulation.
    pub from:    Option<AgentId>,
    /// Declared recipients.  Recipients that are not active when the message
    /// is delivered are skipped.
    pub to:      Vec<AgentId>,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(from: Option<AgentId>, to: Vec<AgentId>, payload: Vec<u8>) -> Self {
        Self { from, to, payload }
    }

    /// A message to a single recipient.
    pub fn direct(from: Option<AgentId>, to: AgentId, payload: Vec<u8>) -> Self {
        Self::new(from, vec![to], payload)
    }
}
