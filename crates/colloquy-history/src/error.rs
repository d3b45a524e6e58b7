//! Error types for colloquy-history

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// History error type
#[derive(Debug, Error)]
pub enum Error {
    /// Event payload could not be (de)serialized
    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// Replication failed
    #[error("Replication error: {0}")]
    Netcode(#[from] colloquy_netcode::Error),
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, Error>;

/// Logs each distinct failure signature at most once
#[derive(Debug, Default)]
pub struct ErrorOnce {
    seen: Mutex<HashSet<String>>,
}

impl ErrorOnce {
    /// Create an empty reporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `error` under `context` unless the same signature was logged before.
    ///
    /// Returns true if this call produced a log line.
    pub fn report(&self, context: &str, error: &dyn std::error::Error) -> bool {
        let signature = format!("{}: {}", context, error);
        let fresh = self
            .seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(signature);
        if fresh {
            tracing::error!(context, error = %error, "replicated payload rejected");
        }
        fresh
    }

    /// Forget every signature seen so far
    pub fn reset(&self) {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_once_per_signature() {
        let once = ErrorOnce::new();
        let a = serde_json::from_str::<Vec<u8>>("[").unwrap_err();
        let b = serde_json::from_str::<Vec<u8>>("{").unwrap_err();

        assert!(once.report("payload", &a));
        assert!(!once.report("payload", &a));
        assert!(once.report("payload", &b));
        assert!(once.report("other", &a));

        once.reset();
        assert!(once.report("payload", &a));
    }
}
