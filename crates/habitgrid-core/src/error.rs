//! Core error types for habitgrid-core.
//!
//! The taxonomy follows the three ways a habit tracker can go wrong:
//! the backing store is unreachable or holds garbage ([`StoreError`]),
//! the user typed something unusable ([`ValidationError`]), or the
//! configuration file is broken ([`ConfigError`]).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for habitgrid-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No identity is signed in
    #[error("Not signed in")]
    NotSignedIn,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by a challenge store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O or transport failure on list/save/delete
    #[error("Store unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Stored data does not parse or fails shape validation
    #[error("Malformed data under '{key}': {message}")]
    Malformed { key: String, message: String },
}

impl StoreError {
    /// Unavailable error without an underlying cause.
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Malformed error for the document stored under `key`.
    pub fn malformed(key: impl Into<String>, err: impl std::fmt::Display) -> Self {
        StoreError::Malformed {
            key: key.into(),
            message: err.to_string(),
        }
    }

    /// Whether retrying the same call could succeed.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be prepared
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validation errors for user input. Raised before any mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was left empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Habit id not present on the challenge
    #[error("Unknown habit '{habit_id}' in challenge '{challenge_id}'")]
    UnknownHabit {
        challenge_id: String,
        habit_id: String,
    },

    /// Challenge id not present in the collection
    #[error("Unknown challenge '{0}'")]
    UnknownChallenge(String),

    /// Day index outside the challenge span
    #[error("Day {day} out of range 1..={day_count}")]
    DayOutOfRange { day: u32, day_count: u32 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Unavailable {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Unavailable {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
