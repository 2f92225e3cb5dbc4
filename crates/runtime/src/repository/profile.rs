//! The saved player profile and the repository contract.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use nexus_core::{ClueId, SceneId, WorldState};
use serde::{Deserialize, Serialize};

use super::Result;

/// What survives between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: String,
    #[serde(default)]
    pub inventory: Vec<ClueId>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub current_scene_id: Option<SceneId>,
    pub saved_at: DateTime<Utc>,
}

impl PlayerProfile {
    /// Captures the persistent part of a world state.
    pub fn capture(id: impl Into<String>, world: &WorldState) -> Self {
        Self {
            id: id.into(),
            inventory: world.inventory.iter().copied().collect(),
            tags: world.tags.iter().cloned().collect(),
            current_scene_id: world.current_scene_id,
            saved_at: Utc::now(),
        }
    }

    /// Replaces the world's inventory and tags with the saved ones.
    ///
    /// The saved scene is not entered here; the runtime does that once the
    /// stage is ready.
    pub fn apply(&self, world: &mut WorldState) {
        world.inventory = self.inventory.iter().copied().collect::<BTreeSet<_>>();
        world.tags = self.tags.iter().cloned().collect();
    }

    /// Whether the persistent fields match the world, ignoring `saved_at`.
    pub fn matches(&self, world: &WorldState) -> bool {
        self.current_scene_id == world.current_scene_id
            && self.inventory.iter().copied().eq(world.inventory.iter().copied())
            && self.tags.iter().eq(world.tags.iter())
    }
}

/// Storage for player profiles, keyed by profile id.
pub trait ProfileRepository: Send + Sync {
    fn save(&self, profile: &PlayerProfile) -> Result<()>;

    fn load(&self, id: &str) -> Result<Option<PlayerProfile>>;

    fn exists(&self, id: &str) -> bool;

    fn delete(&self, id: &str) -> Result<()>;

    /// All stored profile ids, sorted.
    fn list_ids(&self) -> Result<Vec<String>> {
        Ok(vec![])
    }
}
