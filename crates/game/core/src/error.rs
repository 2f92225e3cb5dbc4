//! Common error infrastructure for nexus-core.
//!
//! Domain-specific errors (e.g. [`PathError`](crate::navmesh::PathError)) are
//! defined next to the component that raises them. This module only provides
//! the shared classification used by the runtime to decide how loudly to log
//! a failure and whether the surrounding sequence can carry on.
//!
//! # Design Principles
//!
//! - **Type Safety**: each component has its own error type with specific variants
//! - **Taxonomy**: every error maps onto one [`ErrorKind`]
//! - **Graceful skip**: in-world failures are recoverable, nothing crashes the update loop

/// Broad failure category shared by every engine error.
///
/// - **NotFound**: missing dialogue/action/scene/spawnpoint/character. The
///   operation becomes a no-op.
/// - **InvalidState**: starting a sequence while one runs, selecting a choice
///   that is not exposed, following a dangling node id.
/// - **LoadFailure**: an asset or content file failed to load or parse. Affects
///   only that asset.
/// - **Configuration**: legacy or ambiguous data shapes, normalized at the load
///   boundary with a warning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    LoadFailure,
    Configuration,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidState => "invalid_state",
            Self::LoadFailure => "load_failure",
            Self::Configuration => "configuration",
        }
    }
}

/// Severity level of an error, used for logging priorities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorSeverity {
    /// Expected in normal play; logged at `warn` and skipped.
    Recoverable,

    /// Unexpected state inconsistency (poisoned lock, closed channel).
    /// These indicate bugs and should be investigated.
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Internal => "internal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Common trait for all engine errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify by what the caller should do, not by how bad it looks
pub trait EngineError: core::fmt::Display + core::fmt::Debug {
    /// Returns the taxonomy bucket of this error.
    fn kind(&self) -> ErrorKind;

    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        self.kind().as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("missing thing")]
    struct Missing;

    impl EngineError for Missing {
        fn kind(&self) -> ErrorKind {
            ErrorKind::NotFound
        }
    }

    #[test]
    fn defaults_to_recoverable_with_kind_code() {
        let error = Missing;
        assert!(error.severity().is_recoverable());
        assert_eq!(error.error_code(), "not_found");
    }
}
