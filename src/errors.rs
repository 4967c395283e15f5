// src/errors.rs
use std::io;

use thiserror::Error;

/// Error type for source, delivery and persistence failures.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("source '{source_id}' is unavailable: {reason}")]
    SourceUnavailable { source_id: String, reason: String },
    #[error("record '{key}' is unparseable: {reason}")]
    RecordUnparseable { key: String, reason: String },
    #[error("transport '{transport}' failed: {reason}")]
    Transport { transport: String, reason: String },
    #[error("failed persisting {path}: {reason}")]
    Persistence { path: String, reason: String },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RelayError {
    pub fn source_unavailable(source_id: impl Into<String>, reason: impl ToString) -> Self {
        RelayError::SourceUnavailable { source_id: source_id.into(), reason: reason.to_string() }
    }

    pub fn transport(transport: impl Into<String>, reason: impl ToString) -> Self {
        RelayError::Transport { transport: transport.into(), reason: reason.to_string() }
    }
}

pub type Result<T, E = RelayError> = std::result::Result<T, E>;
