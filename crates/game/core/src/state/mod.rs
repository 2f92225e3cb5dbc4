//! Session world state.
//!
//! One [`WorldState`] exists per running game session. The runtime wraps it
//! in a shared lock and mutates it only from the interpreter, the sequencer,
//! the dialogue engine and the gateway controller.
mod debug_log;

pub use debug_log::DebugLog;

use std::collections::BTreeSet;

use crate::ids::{ActionId, ActorId, ClueId, DialogueId, GatewayId, NodeId, SceneId, SectorId};

/// Dialogue currently on screen.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ActiveDialogue {
    pub dialogue_id: DialogueId,
    pub node_id: NodeId,
}

/// Action sequence currently executing and the actor that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TriggeredAction {
    pub action_id: ActionId,
    pub owner: ActorId,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WorldState {
    pub inventory: BTreeSet<ClueId>,
    pub tags: BTreeSet<String>,
    pub current_scene_id: Option<SceneId>,
    pub current_sector_id: Option<SectorId>,
    /// Set when the last scene change crossed a sector boundary.
    pub sector_changed: bool,
    pub active_dialogue: Option<ActiveDialogue>,
    pub last_triggered_gateway_id: Option<GatewayId>,
    pub last_triggered_action: Option<TriggeredAction>,
    /// Spawnpoint the player should appear at after the next scene load.
    pub target_spawn_point: Option<String>,
    pub debug_log: DebugLog,
}

impl WorldState {
    pub fn new(initial_inventory: impl IntoIterator<Item = ClueId>, debug_capacity: usize) -> Self {
        Self {
            inventory: initial_inventory.into_iter().collect(),
            tags: BTreeSet::new(),
            current_scene_id: None,
            current_sector_id: None,
            sector_changed: false,
            active_dialogue: None,
            last_triggered_gateway_id: None,
            last_triggered_action: None,
            target_spawn_point: None,
            debug_log: DebugLog::with_capacity(debug_capacity),
        }
    }

    /// Reinitializes the session, keeping only the given starting inventory.
    pub fn reset(&mut self, initial_inventory: impl IntoIterator<Item = ClueId>) {
        let capacity = self.debug_log.capacity();
        *self = Self::new(initial_inventory, capacity);
    }

    pub fn has_clue(&self, clue: ClueId) -> bool {
        self.inventory.contains(&clue)
    }

    /// Returns `true` when the clue was not held before.
    pub fn grant_clue(&mut self, clue: ClueId) -> bool {
        self.inventory.insert(clue)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    /// Records a scene change and flags sector transitions.
    pub fn enter_scene(&mut self, scene: SceneId, sector: Option<SectorId>) {
        self.sector_changed = self.current_scene_id.is_some() && sector != self.current_sector_id;
        self.current_scene_id = Some(scene);
        self.current_sector_id = sector;
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.debug_log.push(line);
    }
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new([], crate::config::EngineConfig::DEFAULT_DEBUG_LOG_CAPACITY)
    }
}
