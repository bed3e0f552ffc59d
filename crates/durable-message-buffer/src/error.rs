//! Buffer error types.

use thiserror::Error;

/// Storage failure in the durable buffer.
///
/// These never describe a delivery problem; a message that could not be
/// delivered is still a successfully buffered message.
#[derive(Error, Debug)]
pub enum BufferError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// A persisted row could not be turned back into a message
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using BufferError.
pub type BufferResult<T> = Result<T, BufferError>;
