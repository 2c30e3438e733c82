//! Error types shared by every Floodgate crate.

use thiserror::Error;

/// Result type alias for Floodgate operations.
pub type FloodgateResult<T> = Result<T, FloodgateError>;

/// Errors that can occur during a Floodgate run.
#[derive(Debug, Error)]
pub enum FloodgateError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to fetch instance stats: {0}")]
    Fetch(String),

    #[error("instance stats did not include stats.user_count")]
    MissingUserCount,

    #[error("history I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt history record on line {line}: {content:?}")]
    Corrupt { line: usize, content: String },

    #[error("failed to start admin command: {0}")]
    Spawn(String),

    #[error("admin command exited with {status}: {stderr}")]
    Actuation { status: String, stderr: String },
}
