//! Event types for different topics.

use chrono::{DateTime, Utc};
use glam::Vec3;
use nexus_core::{
    ActionId, ActorId, ClueId, DialogueId, DiscoveryPhase, DiscoveryUpdate, GatewayId, NodeId,
    SceneId, SectorId,
};
use serde::{Deserialize, Serialize};

use super::bus::Event;
use crate::sequencer::Completion;

/// Changes to the session's world state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    ClueGranted {
        clue: ClueId,
        title: String,
    },
    TagSet {
        tag: String,
    },
    TagRemoved {
        tag: String,
    },
    SceneEntered {
        scene: SceneId,
        sector: Option<SectorId>,
        spawnpoint: Option<String>,
        sector_changed: bool,
    },
    GatewayActivated {
        gateway: GatewayId,
    },
    SequenceStarted {
        action_id: ActionId,
        owner: ActorId,
    },
    SequenceFinished {
        action_id: ActionId,
        steps_run: usize,
        completion: Completion,
    },
    SessionReset,
}

/// Dialogue lifecycle, in order: opened, node entered, reveal progress,
/// choices exposed, closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DialogueEvent {
    Opened {
        dialogue: DialogueId,
        speaker: Option<ActorId>,
    },
    NodeEntered {
        dialogue: DialogueId,
        node: NodeId,
        text: String,
    },
    TextRevealed {
        dialogue: DialogueId,
        node: NodeId,
        visible: String,
    },
    ChoicesExposed {
        dialogue: DialogueId,
        node: NodeId,
        choices: Vec<String>,
    },
    Closed {
        dialogue: DialogueId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MotionEvent {
    WalkStarted {
        actor: ActorId,
        destination: Vec3,
        waypoints: usize,
    },
    Arrived {
        actor: ActorId,
        position: Vec3,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DiscoveryEvent {
    Started {
        clue: ClueId,
        model_url: Option<String>,
    },
    PhaseChanged {
        clue: ClueId,
        phase: DiscoveryPhase,
    },
    Finished {
        clue: ClueId,
    },
}

impl From<DiscoveryUpdate> for DiscoveryEvent {
    fn from(update: DiscoveryUpdate) -> Self {
        match update {
            DiscoveryUpdate::Started { clue, model_url } => Self::Started { clue, model_url },
            DiscoveryUpdate::PhaseChanged { clue, phase } => Self::PhaseChanged { clue, phase },
            DiscoveryUpdate::Finished { clue } => Self::Finished { clue },
        }
    }
}

/// One human-readable debug line, mirrored from the world's debug log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugEvent {
    pub line: String,
    pub at: DateTime<Utc>,
}

impl DebugEvent {
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            at: Utc::now(),
        }
    }
}

macro_rules! into_event {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Event {
                fn from(event: $ty) -> Self {
                    Event::$variant(event)
                }
            }
        )*
    };
}

into_event! {
    WorldEvent => World,
    DialogueEvent => Dialogue,
    MotionEvent => Motion,
    DiscoveryEvent => Discovery,
    DebugEvent => Debug,
}
