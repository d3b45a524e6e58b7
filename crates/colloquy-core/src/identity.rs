//! Identity types for actors and events

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable numeric key of an actor in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl ActorId {
    /// Create a new actor ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor:{}", self.0)
    }
}

/// 128-bit identifier of an event
///
/// The nil value is [`EventId::ROOT`]: the parent of every root event and
/// the sentinel that is always present in the spoken record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub Uuid);

impl EventId {
    /// The zero id
    pub const ROOT: EventId = EventId(Uuid::nil());

    /// Build an id from its 16 raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Non-deterministic id, only for standalone sessions
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Raw bytes of the id
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Whether this is the zero id
    pub fn is_root(&self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
