//! Engine model for the nexus adventure runtime.
//!
//! `nexus-core` holds the pure, synchronous pieces of the engine: ids and
//! world state, normalized action steps, dialogue trees with the typewriter
//! reveal, the navmesh pathfinder, character motion, gateways and the clue
//! discovery effect. Nothing here performs I/O or awaits; the runtime crate
//! drives these types from its update loop and async sequencers.
pub mod action;
pub mod config;
pub mod content;
pub mod dialogue;
pub mod discovery;
pub mod error;
pub mod gateway;
pub mod ids;
pub mod motion;
pub mod navmesh;
pub mod state;

pub use action::{ActionDefinition, ActionStep, ActorRef, DialogueRef, StepKind, StepParams};
pub use config::EngineConfig;
pub use content::{
    CharacterDef, Clue, Content, Media, MediaKind, MeshGeometry, NpcPlacement, Scene, Sector,
    Spawnpoint,
};
pub use dialogue::{Dialogue, DialogueChoice, DialogueNode, DialogueTree, NextNode, RevealStep, Typewriter};
pub use discovery::{DiscoveryEffect, DiscoveryFrame, DiscoveryPhase, DiscoveryQueue, DiscoveryUpdate};
pub use error::{EngineError, ErrorKind, ErrorSeverity};
pub use gateway::{CursorHint, Gateway, GatewayKind, ScreenRect, TriggerCondition, gateway_at};
pub use ids::{
    ActionId, ActorId, CharacterId, ClueId, DialogueId, GatewayId, MediaId, NodeId, SceneId,
    SectorId,
};
pub use motion::{
    AnimationState, Arrival, ArrivalCallback, Character, CharacterMotion, MeshHandle, MotionError,
    WalkTicket,
};
pub use navmesh::{NavMesh, NavMeshError, NoPathReason, PathError, Pathfinder};
pub use state::{ActiveDialogue, DebugLog, TriggeredAction, WorldState};
