//! Shape problems found while normalizing authored content.
//!
//! None of these are fatal. Each one is logged once at the load boundary and
//! the affected record is repaired or skipped.

use nexus_core::{EngineError, ErrorKind};
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContentWarning {
    #[error("{collection}[{index}] is not an object")]
    MalformedRecord { collection: &'static str, index: usize },

    #[error("{collection}[{index}] has no usable id")]
    MissingId { collection: &'static str, index: usize },

    #[error("step has no type field")]
    MissingStepKind,

    #[error("unrecognized step kind '{raw}'")]
    UnknownStepKind { raw: String },

    #[error("dialogue {dialogue} stores nodes as a keyed map")]
    KeyedDialogueNodes { dialogue: String },

    #[error("dialogue {dialogue} node keyed '{key}' also names itself '{inner}'; keeping the key")]
    KeyedNodeIdMismatch {
        dialogue: String,
        key: String,
        inner: String,
    },

    #[error("dialogue {dialogue} repeats node id '{node}'; keeping the first")]
    DuplicateNodeId { dialogue: String, node: String },

    #[error("dialogue {dialogue} node '{node}' points at missing node '{target}'")]
    DanglingNextNode {
        dialogue: String,
        node: String,
        target: String,
    },

    #[error("gateway trigger condition '{raw}' is not recognized")]
    UnknownTriggerCondition { raw: String },

    #[error("gateway {gateway} in scene {scene} has no usable target")]
    InertGateway { scene: u32, gateway: u32 },

    #[error("scene {scene} mesh '{mesh}' has invalid geometry")]
    InvalidGeometry { scene: u32, mesh: String },
}

impl EngineError for ContentWarning {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedRecord { .. } => "CONTENT_MALFORMED_RECORD",
            Self::MissingId { .. } => "CONTENT_MISSING_ID",
            Self::MissingStepKind => "CONTENT_MISSING_STEP_KIND",
            Self::UnknownStepKind { .. } => "CONTENT_UNKNOWN_STEP_KIND",
            Self::KeyedDialogueNodes { .. } => "CONTENT_KEYED_NODES",
            Self::KeyedNodeIdMismatch { .. } => "CONTENT_KEYED_NODE_ID",
            Self::DuplicateNodeId { .. } => "CONTENT_DUPLICATE_NODE",
            Self::DanglingNextNode { .. } => "CONTENT_DANGLING_NEXT",
            Self::UnknownTriggerCondition { .. } => "CONTENT_UNKNOWN_TRIGGER",
            Self::InertGateway { .. } => "CONTENT_INERT_GATEWAY",
            Self::InvalidGeometry { .. } => "CONTENT_INVALID_GEOMETRY",
        }
    }
}

/// Collects warnings raised during normalization.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<ContentWarning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, warning: ContentWarning) {
        warn!(target: "nexus::content", code = warning.error_code(), "{warning}");
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[ContentWarning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }
}
