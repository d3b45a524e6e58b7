//! History configuration

use serde::{Deserialize, Serialize};

/// Bounds of every conversation log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Number of initiator/responder pairs kept per actor; 0 keeps nothing
    pub max_pairs: usize,
}

impl HistoryConfig {
    /// Configuration keeping `max_pairs` pairs
    pub fn with_max_pairs(max_pairs: usize) -> Self {
        Self {
            max_pairs,
        }
    }

    /// Maximum number of entries in one log
    pub fn max_entries(&self) -> usize {
        self.max_pairs.saturating_mul(2)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_pairs: 3 }
    }
}
