use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// Content repository id of a scene.
    SceneId,
    "scene"
);
numeric_id!(
    /// Content repository id of a sector (a group of scenes).
    SectorId,
    "sector"
);
numeric_id!(
    /// Content repository id of an authored character.
    CharacterId,
    "character"
);
numeric_id!(
    /// Content repository id of a clue.
    ClueId,
    "clue"
);
numeric_id!(
    /// Content repository id of an action definition.
    ActionId,
    "action"
);
numeric_id!(
    /// Content repository id of a dialogue.
    DialogueId,
    "dialogue"
);
numeric_id!(
    /// Id of a gateway within its scene.
    GatewayId,
    "gateway"
);
numeric_id!(MediaId, "media");

/// Dialogue node identifier. Unique within one tree.
pub type NodeId = String;

/// A character instance in the running scene.
///
/// There is exactly one player; every other actor is an NPC spawned from an
/// authored character.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ActorId {
    Player,
    Npc(CharacterId),
}

impl ActorId {
    #[inline]
    pub const fn is_player(self) -> bool {
        matches!(self, Self::Player)
    }

    pub const fn character_id(self) -> Option<CharacterId> {
        match self {
            Self::Player => None,
            Self::Npc(id) => Some(id),
        }
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::Player
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => f.write_str("player"),
            Self::Npc(id) => write!(f, "npc({})", id.0),
        }
    }
}

impl From<CharacterId> for ActorId {
    fn from(id: CharacterId) -> Self {
        Self::Npc(id)
    }
}
