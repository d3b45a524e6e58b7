//! Authority roles
//!
//! A distributed session has exactly one participant that generates
//! content (the authority); everyone else only applies what it replicates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who owns a generating action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorityRole {
    /// Generates events and already holds them before they replicate
    Authority,
    /// Receives events through replication and applies them once
    Follower,
}

/// How a participant takes part in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticipantMode {
    /// Single participant, no replication
    Standalone,
    /// Lockstep session with the given role
    Distributed(AuthorityRole),
}

impl ParticipantMode {
    /// Whether mutations must go through replication
    pub fn is_distributed(&self) -> bool {
        matches!(self, ParticipantMode::Distributed(_))
    }

    /// Role of this participant; a standalone participant is its own authority
    pub fn role(&self) -> AuthorityRole {
        match self {
            ParticipantMode::Standalone => AuthorityRole::Authority,
            ParticipantMode::Distributed(role) => *role,
        }
    }

    /// Whether replicated responder payloads must be merged into the local queue
    pub fn merges_replicated_payloads(&self) -> bool {
        matches!(self, ParticipantMode::Distributed(AuthorityRole::Follower))
    }
}

impl fmt::Display for ParticipantMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantMode::Standalone => write!(f, "standalone"),
            ParticipantMode::Distributed(AuthorityRole::Authority) => write!(f, "authority"),
            ParticipantMode::Distributed(AuthorityRole::Follower) => write!(f, "follower"),
        }
    }
}
