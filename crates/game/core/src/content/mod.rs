//! Read-only content snapshot.
//!
//! The snapshot is fetched once at session start and never mutated by the
//! engine. Every entity is keyed by its repository id.
mod scene;

pub use scene::{MeshGeometry, NpcPlacement, Scene, Spawnpoint};

use std::collections::BTreeMap;

use crate::action::{ActionDefinition, ActorRef, DialogueRef};
use crate::dialogue::Dialogue;
use crate::ids::{ActionId, CharacterId, ClueId, DialogueId, MediaId, SceneId, SectorId};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Sector {
    pub id: SectorId,
    #[serde(default)]
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CharacterDef {
    pub id: CharacterId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub is_player: bool,
}

impl CharacterDef {
    /// Matches a slug or display name, ignoring case.
    pub fn answers_to(&self, name: &str) -> bool {
        self.slug.eq_ignore_ascii_case(name) || self.name.eq_ignore_ascii_case(name)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Clue {
    pub id: ClueId,
    #[serde(default)]
    pub title: String,
    /// Held from the start of a fresh session.
    #[serde(default)]
    pub initial: bool,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum MediaKind {
    Image2d,
    Model3d,
    Music,
    Sfx,
    Other,
}

impl MediaKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "2d" | "image" => Self::Image2d,
            "3d" | "model" => Self::Model3d,
            "music" => Self::Music,
            "sfx" | "sound" => Self::Sfx,
            _ => Self::Other,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Media {
    pub id: MediaId,
    pub filepad: String,
    pub kind: MediaKind,
    #[serde(default)]
    pub imageable_id: Option<u32>,
    #[serde(default)]
    pub imageable_type: String,
}

impl Media {
    pub fn belongs_to(&self, owner_type: &str, owner_id: u32) -> bool {
        self.imageable_id == Some(owner_id) && self.imageable_type.contains(owner_type)
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Content {
    pub scenes: BTreeMap<SceneId, Scene>,
    pub sectors: BTreeMap<SectorId, Sector>,
    pub characters: BTreeMap<CharacterId, CharacterDef>,
    pub clues: BTreeMap<ClueId, Clue>,
    pub dialogues: BTreeMap<DialogueId, Dialogue>,
    pub actions: BTreeMap<ActionId, ActionDefinition>,
    pub media: BTreeMap<MediaId, Media>,
    pub configs: BTreeMap<String, serde_json::Value>,
}

impl Content {
    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.get(&id)
    }

    pub fn action(&self, id: ActionId) -> Option<&ActionDefinition> {
        self.actions.get(&id)
    }

    pub fn clue(&self, id: ClueId) -> Option<&Clue> {
        self.clues.get(&id)
    }

    pub fn dialogue(&self, key: &DialogueRef) -> Option<&Dialogue> {
        match key {
            DialogueRef::Id(id) => self.dialogues.get(id),
            DialogueRef::Slug(_) => self.dialogues.values().find(|d| d.matches(key)),
        }
    }

    /// Resolves a character by id or by name. `Owner` and `Player` are
    /// resolved by the caller.
    pub fn character(&self, actor: &ActorRef) -> Option<&CharacterDef> {
        match actor {
            ActorRef::Character(id) => self.characters.get(id),
            ActorRef::Named(name) => self.characters.values().find(|c| c.answers_to(name)),
            ActorRef::Owner | ActorRef::Player => None,
        }
    }

    pub fn player_character(&self) -> Option<&CharacterDef> {
        self.characters.values().find(|c| c.is_player)
    }

    /// Clues flagged as held at session start.
    pub fn initial_inventory(&self) -> Vec<ClueId> {
        self.clues.values().filter(|c| c.initial).map(|c| c.id).collect()
    }

    /// The 3D model attached to a clue, if any.
    pub fn clue_model(&self, clue: ClueId) -> Option<&Media> {
        self.media
            .values()
            .find(|m| m.kind == MediaKind::Model3d && m.belongs_to("Clue", clue.0))
    }

    /// The first scene by id, used when a session has no saved scene.
    pub fn first_scene(&self) -> Option<&Scene> {
        self.scenes.values().next()
    }

    /// Scene a fresh session opens in: the `opening_scene` config when it
    /// names an existing scene, else the first scene.
    pub fn opening_scene(&self) -> Option<&Scene> {
        let configured = self.configs.get("opening_scene").and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
        configured
            .and_then(|id| self.scene(SceneId(id)))
            .or_else(|| self.first_scene())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clue_model_matches_owner_type_and_kind() {
        let mut content = Content::default();
        content.media.insert(
            MediaId(1),
            Media {
                id: MediaId(1),
                filepad: "clues/key.png".into(),
                kind: MediaKind::Image2d,
                imageable_id: Some(4),
                imageable_type: "App\\Models\\Clue".into(),
            },
        );
        content.media.insert(
            MediaId(2),
            Media {
                id: MediaId(2),
                filepad: "clues/key.glb".into(),
                kind: MediaKind::Model3d,
                imageable_id: Some(4),
                imageable_type: "App\\Models\\Clue".into(),
            },
        );
        assert_eq!(content.clue_model(ClueId(4)).map(|m| m.id), Some(MediaId(2)));
        assert!(content.clue_model(ClueId(5)).is_none());
    }

    #[test]
    fn opening_scene_prefers_config() {
        let mut content = Content::default();
        content.scenes.insert(SceneId(1), Scene::new(SceneId(1), "a"));
        content.scenes.insert(SceneId(4), Scene::new(SceneId(4), "b"));
        assert_eq!(content.opening_scene().map(|s| s.id), Some(SceneId(1)));

        content.configs.insert("opening_scene".into(), serde_json::json!("4"));
        assert_eq!(content.opening_scene().map(|s| s.id), Some(SceneId(4)));

        content.configs.insert("opening_scene".into(), serde_json::json!(99));
        assert_eq!(content.opening_scene().map(|s| s.id), Some(SceneId(1)));
    }

    #[test]
    fn characters_resolve_by_name_or_slug() {
        let mut content = Content::default();
        content.characters.insert(
            CharacterId(3),
            CharacterDef {
                id: CharacterId(3),
                name: "Hank Miller".into(),
                slug: "hank".into(),
                is_player: false,
            },
        );
        assert!(content.character(&ActorRef::Named("HANK".into())).is_some());
        assert!(content.character(&ActorRef::Named("hank miller".into())).is_some());
        assert!(content.character(&ActorRef::Character(CharacterId(3))).is_some());
        assert!(content.character(&ActorRef::Player).is_none());
    }
}
