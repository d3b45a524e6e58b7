//! Error types for colloquy-session

use colloquy_core::ActorId;
use thiserror::Error;

/// Session error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("History error: {0}")]
    History(#[from] colloquy_history::Error),

    #[error("Only the authority can record generations")]
    NotAuthority,

    #[error("Unknown actor: {0}")]
    UnknownActor(ActorId),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
