//! Error types raised by repository implementations.

use nexus_core::{EngineError, ErrorKind, ErrorSeverity};
use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("profile repository lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("invalid profile id {0:?}")]
    InvalidId(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

impl EngineError for RepositoryError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidId(_) => ErrorKind::Configuration,
            _ => ErrorKind::LoadFailure,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::LockPoisoned => ErrorSeverity::Internal,
            _ => ErrorSeverity::Recoverable,
        }
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
