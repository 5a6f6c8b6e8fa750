//! Error taxonomy shared by the editor session and its transports.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// Out-of-bounds cell or malformed command. Never retried.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Caller may not edit this map. Never retried.
    #[error("Permission denied: {0}")]
    Permission(String),

    /// Stale cell or map reference, e.g. rotating a cell another client removed.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network or backend failure.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),
}

impl EditorError {
    /// Map an HTTP status and error message to the editor taxonomy.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 | 422 => EditorError::Validation(message),
            401 | 403 => EditorError::Permission(message),
            404 => EditorError::NotFound(message),
            _ => EditorError::Transport(message),
        }
    }

    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EditorError::Transport(_) | EditorError::Timeout(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RotationError {
    #[error("Rotation must be between 0 and 3, got {0}")]
    OutOfRange(i64),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KindError {
    #[error("Unknown building kind: {0}")]
    Unknown(String),
}
