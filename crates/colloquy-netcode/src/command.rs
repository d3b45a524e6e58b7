//! Replicated commands
//!
//! The only mutations that cross the wire. Each one is applied on every
//! participant, sender included, in the single order the transport agrees on.

use colloquy_core::{ActorId, EventId, Role};
use serde::{Deserialize, Serialize};

/// A mutation every participant applies identically
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicatedCommand {
    /// Append one line to an actor's conversation log
    AddHistory {
        /// Owner of the log
        actor: ActorId,
        /// Side of the turn
        role: Role,
        /// Line text; for responders, usually a serialized event list
        text: String,
    },
    /// Suppress an event
    IgnoreEvent {
        /// Event to suppress
        id: EventId,
        /// Also suppress events descending from it
        ignore_children: bool,
    },
}

impl ReplicatedCommand {
    /// Short command name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ReplicatedCommand::AddHistory { .. } => "add_history",
            ReplicatedCommand::IgnoreEvent { .. } => "ignore_event",
        }
    }

    /// Frame the command for the transport
    pub fn encode(&self) -> crate::Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Unframe a command received from the transport
    pub fn decode(frame: &[u8]) -> crate::Result<Self> {
        Ok(bincode::deserialize(frame)?)
    }
}
