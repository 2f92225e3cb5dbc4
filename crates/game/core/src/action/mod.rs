//! Action definitions and the steps they are made of.
//!
//! An [`ActionDefinition`] is an authored, immutable list of [`ActionStep`]s.
//! Steps reach this module already normalized: the kind is one of the
//! canonical [`StepKind`]s and every parameter uses a canonical key from
//! [`params::keys`]. Execution lives in the runtime crate.
mod kind;
pub mod params;

pub use kind::StepKind;
pub use params::{ActorRef, DialogueRef, StepParams};

use crate::ids::{ActionId, ClueId, SceneId};

/// One instruction within an action sequence or dialogue hook.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ActionStep {
    pub kind: StepKind,
    #[serde(default)]
    pub params: StepParams,
}

impl ActionStep {
    pub fn new(kind: StepKind) -> Self {
        Self {
            kind,
            params: StepParams::new(),
        }
    }

    pub fn with_params(kind: StepKind, params: StepParams) -> Self {
        Self { kind, params }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key, value);
        self
    }

    pub fn end() -> Self {
        Self::new(StepKind::End)
    }

    pub fn give_clue(clue: ClueId) -> Self {
        Self::new(StepKind::GiveClue).param(params::keys::CLUE, clue.0)
    }

    pub fn wait(seconds: f32) -> Self {
        Self::new(StepKind::IdleWait).param(params::keys::DURATION, seconds)
    }

    pub fn walk_to_spawnpoint(actor: &str, spawnpoint: &str) -> Self {
        Self::new(StepKind::WalkTo)
            .param(params::keys::ACTOR, actor)
            .param(params::keys::SPAWNPOINT, spawnpoint)
    }

    pub fn goto_scene(scene: SceneId) -> Self {
        Self::new(StepKind::GotoScene).param(params::keys::SCENE, scene.0)
    }

    pub fn is_end(&self) -> bool {
        self.kind == StepKind::End
    }
}

/// Authored action: a named list of steps executed in order.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ActionDefinition {
    pub id: ActionId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<ActionStep>,
}

impl ActionDefinition {
    pub fn new(id: ActionId, name: impl Into<String>, steps: Vec<ActionStep>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            steps,
        }
    }

    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            self.id.to_string()
        } else {
            self.name.clone()
        }
    }
}
