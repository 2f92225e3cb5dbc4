//! Shared state of one play session.
//!
//! A [`Session`] is handed to every component as `Arc<Session>`. Each piece of
//! mutable state sits behind its own short-lived `std::sync::Mutex`; callers
//! go through the `with_*` accessors, which never hold a guard past the
//! closure and therefore never across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::Vec3;
use nexus_content::AssetResolver;
use nexus_core::{
    ActorId, ActorRef, CharacterMotion, ClueId, Content, DiscoveryQueue, EngineConfig, SceneId,
    Spawnpoint, WorldState,
};
use tracing::{debug, info, warn};

use crate::events::{DebugEvent, Event, EventBus, MotionEvent, WorldEvent};
use crate::stage::{SceneError, SceneLoader, Stage};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Session {
    config: EngineConfig,
    content: Arc<Content>,
    world: Mutex<WorldState>,
    motion: Mutex<CharacterMotion>,
    discovery: Mutex<DiscoveryQueue>,
    stage: Stage,
    events: EventBus,
    assets: Arc<dyn AssetResolver>,
}

impl Session {
    pub fn new(
        config: EngineConfig,
        content: Arc<Content>,
        loader: Arc<dyn SceneLoader>,
        assets: Arc<dyn AssetResolver>,
        events: EventBus,
    ) -> Self {
        let world = WorldState::new(content.initial_inventory(), config.debug_log_capacity);
        Self {
            motion: Mutex::new(CharacterMotion::new(&config)),
            stage: Stage::new(loader, &config),
            world: Mutex::new(world),
            discovery: Mutex::new(DiscoveryQueue::new()),
            config,
            content,
            events,
            assets,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn content(&self) -> &Arc<Content> {
        &self.content
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn assets(&self) -> &Arc<dyn AssetResolver> {
        &self.assets
    }

    pub fn with_world<R>(&self, f: impl FnOnce(&mut WorldState) -> R) -> R {
        f(&mut lock(&self.world))
    }

    pub fn with_motion<R>(&self, f: impl FnOnce(&mut CharacterMotion) -> R) -> R {
        f(&mut lock(&self.motion))
    }

    pub fn with_discovery<R>(&self, f: impl FnOnce(&mut DiscoveryQueue) -> R) -> R {
        f(&mut lock(&self.discovery))
    }

    /// Copy of the current world state.
    pub fn world(&self) -> WorldState {
        lock(&self.world).clone()
    }

    pub fn publish(&self, event: impl Into<Event>) {
        self.events.publish(event);
    }

    /// Appends a line to the world's debug log and mirrors it on the bus.
    pub fn log(&self, line: impl Into<String>) {
        let line = line.into();
        debug!(target: "nexus::session", "{line}");
        self.with_world(|world| world.log(line.clone()));
        self.publish(DebugEvent::new(line));
    }

    /// Maps a step's actor reference onto a spawned character id.
    ///
    /// Characters flagged as the player, or named as the scene's player
    /// character, resolve to [`ActorId::Player`].
    pub fn resolve_actor(&self, actor: &ActorRef, owner: ActorId) -> Option<ActorId> {
        match actor {
            ActorRef::Owner => Some(owner),
            ActorRef::Player => Some(ActorId::Player),
            ActorRef::Character(_) | ActorRef::Named(_) => {
                let Some(character) = self.content.character(actor) else {
                    warn!(target: "nexus::session", ?actor, "unknown character reference");
                    return None;
                };
                let scene_player = self
                    .stage
                    .current_scene()
                    .and_then(|scene| scene.player_character_id);
                if character.is_player || scene_player == Some(character.id) {
                    Some(ActorId::Player)
                } else {
                    Some(ActorId::Npc(character.id))
                }
            }
        }
    }

    /// Adds a clue to the inventory.
    ///
    /// Returns `true` only the first time. A new clue is logged, announced
    /// and queued for the discovery effect; a held or unknown clue changes
    /// nothing.
    pub fn grant_clue(&self, clue: ClueId) -> bool {
        let Some(definition) = self.content.clue(clue) else {
            warn!(target: "nexus::session", clue = %clue, "clue does not exist");
            return false;
        };
        if !self.with_world(|world| world.grant_clue(clue)) {
            debug!(target: "nexus::session", clue = %clue, "clue already held");
            return false;
        }

        let title = definition.title.clone();
        self.log(format!("DISCOVERED: {title}"));
        self.publish(WorldEvent::ClueGranted { clue, title });

        let model_url = self
            .content
            .clue_model(clue)
            .map(|media| self.assets.resolve(&media.filepad));
        self.with_discovery(|queue| queue.enqueue(clue, model_url));
        true
    }

    pub fn set_tag(&self, tag: &str) {
        if self.with_world(|world| world.set_tag(tag)) {
            self.publish(WorldEvent::TagSet { tag: tag.to_owned() });
        }
    }

    pub fn remove_tag(&self, tag: &str) {
        if self.with_world(|world| world.remove_tag(tag)) {
            self.publish(WorldEvent::TagRemoved { tag: tag.to_owned() });
        }
    }

    /// Loads a scene, rebuilds the navmesh and places every character.
    ///
    /// The player arrives at `spawnpoint` when given, else at the spawnpoint
    /// recorded by the last gateway hover, else at the scene's first
    /// spawnpoint. Any walk in progress is cancelled by the respawn.
    pub async fn enter_scene(
        &self,
        scene_id: SceneId,
        spawnpoint: Option<&str>,
    ) -> Result<(), SceneError> {
        let scene = self
            .content
            .scene(scene_id)
            .cloned()
            .ok_or(SceneError::NotFound(scene_id))?;

        let meshes = self.stage.loader().load(&scene).await?;

        let requested = spawnpoint
            .map(str::to_owned)
            .or_else(|| self.with_world(|world| world.target_spawn_point.clone()));
        let arrival: Option<Spawnpoint> = requested
            .as_deref()
            .and_then(|name| scene.spawnpoint(name))
            .or_else(|| scene.spawnpoints.first())
            .cloned();

        let title = scene.title.clone();
        let sector = scene.sector_id;
        let placements = scene.npcs.clone();
        let positions: Vec<(String, Vec3, Option<f32>)> = scene
            .spawnpoints
            .iter()
            .map(|s| (s.name.clone(), s.position(), s.direction))
            .collect();
        let scale = scene.character_scale.unwrap_or(self.config.character_scale);
        let scene_player = scene.player_character_id;

        self.stage.install(scene, &meshes);

        self.with_motion(|motion| {
            motion.clear_npcs();
            motion.set_scene_scale(scale);

            let (position, degrees) = arrival
                .as_ref()
                .map(|s| (s.position(), s.direction))
                .unwrap_or((Vec3::ZERO, None));
            let degrees = degrees.unwrap_or(self.config.default_spawn_direction);
            motion.spawn(ActorId::Player, position, degrees.to_radians());

            for npc in &placements {
                if Some(npc.character_id) == scene_player {
                    continue;
                }
                let named = npc.spawnpoint.as_deref().and_then(|name| {
                    positions
                        .iter()
                        .find(|(n, _, _)| n == name)
                        .map(|(_, p, d)| (*p, *d))
                });
                let Some((position, direction)) = named.or(npc.position.map(|p| (p, None))) else {
                    warn!(target: "nexus::stage", character = %npc.character_id, "npc placement has no position");
                    continue;
                };
                let degrees = npc.direction.or(direction).unwrap_or(0.0);
                motion.spawn(ActorId::Npc(npc.character_id), position, degrees.to_radians());
            }
        });

        let sector_changed = self.with_world(|world| {
            world.enter_scene(scene_id, sector);
            world.target_spawn_point = None;
            world.sector_changed
        });

        info!(target: "nexus::stage", scene = %scene_id, title = %title, "scene entered");
        self.log(format!("LOADED: {title}"));
        self.publish(WorldEvent::SceneEntered {
            scene: scene_id,
            sector,
            spawnpoint: arrival.map(|s| s.name),
            sector_changed,
        });
        Ok(())
    }

    /// Advances motion and the discovery effect by `dt` seconds.
    pub fn tick(&self, dt: f32) {
        let arrivals = self.with_motion(|motion| motion.tick(dt));
        for arrival in arrivals {
            self.publish(MotionEvent::Arrived {
                actor: arrival.actor,
                position: arrival.position,
            });
        }

        let updates = self.with_discovery(|queue| queue.tick(dt));
        for update in updates {
            self.publish(crate::events::DiscoveryEvent::from(update));
        }
    }

    /// Reinitializes world state, discovery history and characters.
    pub fn reset(&self) {
        let initial = self.content.initial_inventory();
        self.with_world(|world| world.reset(initial));
        self.with_discovery(DiscoveryQueue::reset);
        self.with_motion(|motion| {
            motion.clear_npcs();
            motion.despawn(ActorId::Player);
        });
        self.stage.clear();
        self.publish(WorldEvent::SessionReset);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}
