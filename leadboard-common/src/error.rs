//! Common error types for leadboard

use thiserror::Error;

/// Common result type for leadboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across leadboard crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored JSON column could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested lead or stage not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or disallowed field in a request
    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    /// Operation conflicts with existing state (duplicate key, occupied stage)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a validation error for a named field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
