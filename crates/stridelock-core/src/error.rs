//! Core error types for stridelock-core.
//!
//! This module defines the error hierarchy using thiserror. Sensor errors
//! are deliberately non-fatal at the call sites that matter: source
//! registration failures demote to the next fallback source instead of
//! propagating out of `start()`.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for stridelock-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Preference-store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Sensor and health-platform errors
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    /// Block-event log errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Preference-store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to load preferences
    #[error("Failed to load preferences from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save preferences
    #[error("Failed to save preferences to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse the stored file
    #[error("Failed to parse preferences: {0}")]
    ParseFailed(String),

    /// Invalid preference value
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Sensor and health-platform errors.
#[derive(Error, Debug)]
pub enum SensorError {
    /// The user denied the permission required by a source
    #[error("Permission denied for {0}")]
    PermissionDenied(String),

    /// The hardware or platform source is absent
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// Listener registration was rejected by the platform
    #[error("Failed to register listener for {source_name}: {message}")]
    RegistrationFailed { source_name: String, message: String },

    /// A health-platform aggregate query failed
    #[error("Health query failed: {0}")]
    QueryFailed(String),
}

/// Block-event log errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
