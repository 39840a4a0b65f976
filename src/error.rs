//! Error types for the session store and configuration layer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by session setup and session actions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Setup values rejected before a session is started
    #[error("Invalid value for '{field}': {message}")]
    InvalidSetup {
        field: &'static str,
        message: String,
    },

    /// A mode-specific action was called while that mode is not active
    #[error("No active {mode} session")]
    NoActiveSession { mode: &'static str },

    /// `record_lap` after every question already has a lap
    #[error("All {total} questions have already been answered")]
    AllQuestionsAnswered { total: u32 },
}

/// Configuration persistence errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to save configuration to {path}: {source}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration at {path} is not valid JSON: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode configuration: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
