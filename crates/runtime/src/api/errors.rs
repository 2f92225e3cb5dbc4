//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from the engine components, worker coordination and the
//! profile repository so clients can bubble them up with consistent context.

use nexus_core::{EngineError, ErrorKind, ErrorSeverity};
use thiserror::Error;
use tokio::sync::oneshot;

pub use crate::repository::RepositoryError;

use crate::dialogue::DialogueError;
use crate::interpreter::StepError;
use crate::sequencer::SequenceError;
use crate::stage::SceneError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime requires content to be configured before building")]
    MissingContent,

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Step(#[from] StepError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    Dialogue(#[from] DialogueError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("persistence is not enabled for this runtime")]
    PersistenceDisabled,

    #[error("worker command channel closed")]
    CommandChannelClosed,

    #[error("worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

impl EngineError for RuntimeError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Scene(inner) => inner.kind(),
            Self::Step(inner) => inner.kind(),
            Self::Sequence(inner) => inner.kind(),
            Self::Dialogue(inner) => inner.kind(),
            Self::Repository(inner) => inner.kind(),
            Self::MissingContent | Self::PersistenceDisabled => ErrorKind::Configuration,
            Self::CommandChannelClosed | Self::ReplyChannelClosed(_) | Self::WorkerJoin(_) => {
                ErrorKind::InvalidState
            }
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CommandChannelClosed | Self::ReplyChannelClosed(_) | Self::WorkerJoin(_) => {
                ErrorSeverity::Internal
            }
            Self::Repository(inner) => inner.severity(),
            _ => ErrorSeverity::Recoverable,
        }
    }
}
