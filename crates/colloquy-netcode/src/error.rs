//! Error types for colloquy-netcode

use thiserror::Error;

/// Netcode error type
#[derive(Debug, Error)]
pub enum Error {
    /// Transport error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Command could not be framed or unframed
    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),
}

/// Result type for netcode operations
pub type Result<T> = std::result::Result<T, Error>;
