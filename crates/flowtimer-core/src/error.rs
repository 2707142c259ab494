//! Error types for flowtimer-core.
//!
//! The timer and scheduler state machines are infallible by design -- illegal
//! calls are absorbed as no-ops and failures become recorded entry outcomes.
//! `Result` therefore only appears at the storage boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Storage-layer errors (entry list, session database).
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Session database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },
}

/// Result type alias for StorageError
pub type Result<T, E = StorageError> = std::result::Result<T, E>;
