//! Character motion along computed paths.
//!
//! [`CharacterMotion`] owns every character record and is the only writer of
//! position and path fields. Callers hand it a path and an optional arrival
//! callback; [`CharacterMotion::tick`] advances all walkers and fires each
//! callback exactly once on arrival. A newer walk on the same character
//! replaces the path and drops the older callback without calling it.
mod character;

pub use character::{AnimationState, Character, MeshHandle, shortest_arc, yaw_towards};

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use glam::Vec3;
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::error::{EngineError, ErrorKind};
use crate::ids::ActorId;

/// Invoked once when a walk reaches its final waypoint.
pub type ArrivalCallback = Box<dyn FnOnce() + Send + 'static>;

/// Identifies one `walk_to` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WalkTicket(pub u64);

/// Reported by [`CharacterMotion::tick`] for every finished walk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arrival {
    pub actor: ActorId,
    pub ticket: WalkTicket,
    pub position: Vec3,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MotionError {
    #[error("character {0} is not spawned")]
    UnknownActor(ActorId),
}

impl EngineError for MotionError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NotFound
    }
}

struct PendingWalk {
    ticket: WalkTicket,
    on_arrival: Option<ArrivalCallback>,
}

pub struct CharacterMotion {
    characters: BTreeMap<ActorId, Character>,
    pending: BTreeMap<ActorId, PendingWalk>,
    next_ticket: u64,
    scene_scale: f32,
    base_speed: f32,
    arrival_epsilon: f32,
    turn_rate: f32,
}

impl CharacterMotion {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            characters: BTreeMap::new(),
            pending: BTreeMap::new(),
            next_ticket: 0,
            scene_scale: config.character_scale,
            base_speed: config.walk_speed,
            arrival_epsilon: config.arrival_epsilon,
            turn_rate: config.turn_rate,
        }
    }

    /// Per-scene character scale factor applied to every walk speed.
    pub fn set_scene_scale(&mut self, scale: f32) {
        self.scene_scale = scale;
    }

    pub fn scene_scale(&self) -> f32 {
        self.scene_scale
    }

    /// Places a character, replacing any previous record with the same id.
    pub fn spawn(&mut self, actor: ActorId, position: Vec3, rotation_y: f32) -> &mut Character {
        self.pending.remove(&actor);
        debug!(target: "nexus::motion", actor = %actor, x = position.x, y = position.y, z = position.z, "spawned character");
        let character = Character::new(actor, position, rotation_y, self.base_speed);
        match self.characters.entry(actor) {
            Entry::Occupied(mut slot) => {
                slot.insert(character);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(character),
        }
    }

    pub fn despawn(&mut self, actor: ActorId) -> Option<Character> {
        self.pending.remove(&actor);
        self.characters.remove(&actor)
    }

    /// Removes every NPC, keeping the player.
    pub fn clear_npcs(&mut self) {
        self.characters.retain(|id, _| id.is_player());
        self.pending.retain(|id, _| id.is_player());
    }

    pub fn get(&self, actor: ActorId) -> Option<&Character> {
        self.characters.get(&actor)
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    pub fn position(&self, actor: ActorId) -> Option<Vec3> {
        self.get(actor).map(|c| c.position)
    }

    pub fn is_walking(&self, actor: ActorId) -> bool {
        self.get(actor).is_some_and(|c| c.is_walking)
    }

    pub fn set_mesh(&mut self, actor: ActorId, mesh: MeshHandle) -> Result<(), MotionError> {
        self.character_mut(actor)?.mesh = Some(mesh);
        Ok(())
    }

    /// Starts a walk along `path`.
    ///
    /// An empty path fires `on_arrival` immediately. Any walk already in
    /// progress is replaced and its callback dropped.
    pub fn walk_to(
        &mut self,
        actor: ActorId,
        path: Vec<Vec3>,
        on_arrival: Option<ArrivalCallback>,
    ) -> Result<WalkTicket, MotionError> {
        if !self.characters.contains_key(&actor) {
            return Err(MotionError::UnknownActor(actor));
        }
        self.next_ticket += 1;
        let ticket = WalkTicket(self.next_ticket);

        if let Some(previous) = self.pending.remove(&actor) {
            debug!(
                target: "nexus::motion",
                actor = %actor,
                superseded = previous.ticket.0,
                "walk superseded; dropping previous arrival callback"
            );
        }

        let character = self.character_mut(actor)?;
        if path.is_empty() {
            character.path.clear();
            character.path_index = 0;
            character.is_walking = false;
            if let Some(callback) = on_arrival {
                callback();
            }
            return Ok(ticket);
        }

        character.path = path;
        character.path_index = 0;
        character.is_walking = true;
        character.animation = AnimationState::Walk;
        self.pending.insert(actor, PendingWalk { ticket, on_arrival });
        Ok(ticket)
    }

    /// Cancels a walk in place. The arrival callback is dropped.
    pub fn stop(&mut self, actor: ActorId) -> Result<(), MotionError> {
        self.pending.remove(&actor);
        let character = self.character_mut(actor)?;
        if character.is_walking {
            character.path.clear();
            character.path_index = 0;
            character.is_walking = false;
            character.animation = AnimationState::Idle;
        }
        Ok(())
    }

    /// Instantly turns a character.
    pub fn face(&mut self, actor: ActorId, yaw: f32) -> Result<(), MotionError> {
        self.character_mut(actor)?.rotation_y = yaw;
        Ok(())
    }

    /// Instantly turns `actor` toward `point`. Returns the applied yaw.
    pub fn face_towards(&mut self, actor: ActorId, point: Vec3) -> Result<Option<f32>, MotionError> {
        let character = self.character_mut(actor)?;
        let yaw = yaw_towards(character.position, point);
        if let Some(yaw) = yaw {
            character.rotation_y = yaw;
        }
        Ok(yaw)
    }

    pub fn set_animation(&mut self, actor: ActorId, animation: AnimationState) -> Result<(), MotionError> {
        self.character_mut(actor)?.animation = animation;
        Ok(())
    }

    /// Advances every walking character by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> Vec<Arrival> {
        if dt <= 0.0 {
            return Vec::new();
        }
        let speed_scale = self.scene_scale;
        let epsilon = self.arrival_epsilon;
        let turn_blend = (self.turn_rate * dt).clamp(0.0, 1.0);

        let mut finished = Vec::new();
        for character in self.characters.values_mut() {
            if !character.is_walking {
                continue;
            }
            let mut budget = character.speed * speed_scale * dt;
            let start = character.position;

            while let Some(target) = character.current_target() {
                let to_target = target - character.position;
                let distance = to_target.length();
                if distance < epsilon {
                    character.path_index += 1;
                    continue;
                }
                if budget >= distance {
                    character.position = target;
                    budget -= distance;
                    character.path_index += 1;
                    continue;
                }
                character.position += to_target / distance * budget;
                break;
            }

            let travelled = character.position - start;
            if let Some(heading) = yaw_towards(Vec3::ZERO, travelled) {
                character.rotation_y += shortest_arc(character.rotation_y, heading) * turn_blend;
            }

            if character.path_index >= character.path.len() {
                character.path.clear();
                character.path_index = 0;
                character.is_walking = false;
                character.animation = AnimationState::Idle;
                finished.push(character.id);
            } else {
                trace!(target: "nexus::motion", actor = %character.id, index = character.path_index, "walking");
            }
        }

        let mut arrivals = Vec::with_capacity(finished.len());
        for actor in finished {
            let position = self.position(actor).unwrap_or_default();
            let Some(pending) = self.pending.remove(&actor) else {
                continue;
            };
            debug!(target: "nexus::motion", actor = %actor, ticket = pending.ticket.0, "arrived");
            if let Some(callback) = pending.on_arrival {
                callback();
            }
            arrivals.push(Arrival {
                actor,
                ticket: pending.ticket,
                position,
            });
        }
        arrivals
    }

    fn character_mut(&mut self, actor: ActorId) -> Result<&mut Character, MotionError> {
        self.characters
            .get_mut(&actor)
            .ok_or(MotionError::UnknownActor(actor))
    }
}

impl std::fmt::Debug for CharacterMotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharacterMotion")
            .field("characters", &self.characters)
            .field("pending", &self.pending.len())
            .field("scene_scale", &self.scene_scale)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::CharacterId;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn motion() -> CharacterMotion {
        let mut config = EngineConfig::default();
        config.walk_speed = 1.0;
        config.character_scale = 1.0;
        CharacterMotion::new(&config)
    }

    fn counter() -> (Arc<AtomicUsize>, ArrivalCallback) {
        let hits = Arc::new(AtomicUsize::new(0));
        let clone = Arc::clone(&hits);
        (hits, Box::new(move || {
            clone.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn arrival_fires_once_and_goes_idle() {
        let mut m = motion();
        m.spawn(ActorId::Player, Vec3::ZERO, 0.0);
        let (hits, cb) = counter();
        m.walk_to(ActorId::Player, vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 2.0)], Some(cb))
            .unwrap();
        assert!(m.is_walking(ActorId::Player));
        assert_eq!(m.get(ActorId::Player).unwrap().animation, AnimationState::Walk);

        for _ in 0..40 {
            m.tick(0.1);
        }
        let player = m.get(ActorId::Player).unwrap();
        assert!(!player.is_walking);
        assert_eq!(player.animation, AnimationState::Idle);
        assert!(player.position.distance(Vec3::new(1.0, 0.0, 2.0)) < 1e-4);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        m.tick(0.1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn never_overshoots_the_final_waypoint() {
        let mut m = motion();
        m.spawn(ActorId::Player, Vec3::ZERO, 0.0);
        m.walk_to(ActorId::Player, vec![Vec3::new(0.5, 0.0, 0.0)], None).unwrap();
        let arrivals = m.tick(10.0);
        assert_eq!(arrivals.len(), 1);
        assert_eq!(m.position(ActorId::Player), Some(Vec3::new(0.5, 0.0, 0.0)));
    }

    #[test]
    fn superseded_walk_drops_its_callback() {
        let mut m = motion();
        m.spawn(ActorId::Player, Vec3::ZERO, 0.0);
        let (first, cb1) = counter();
        let (second, cb2) = counter();
        m.walk_to(ActorId::Player, vec![Vec3::new(5.0, 0.0, 0.0)], Some(cb1)).unwrap();
        m.tick(0.5);
        m.walk_to(ActorId::Player, vec![Vec3::new(0.0, 0.0, 1.0)], Some(cb2)).unwrap();
        assert_eq!(m.get(ActorId::Player).unwrap().path_index, 0);
        for _ in 0..30 {
            m.tick(0.1);
        }
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_path_arrives_immediately() {
        let mut m = motion();
        m.spawn(ActorId::Player, Vec3::ZERO, 0.0);
        let (hits, cb) = counter();
        m.walk_to(ActorId::Player, Vec::new(), Some(cb)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!m.is_walking(ActorId::Player));
    }

    #[test]
    fn speed_scales_with_scene_factor() {
        let mut m = motion();
        m.set_scene_scale(2.0);
        m.spawn(ActorId::Player, Vec3::ZERO, 0.0);
        m.walk_to(ActorId::Player, vec![Vec3::new(10.0, 0.0, 0.0)], None).unwrap();
        m.tick(1.0);
        assert!((m.position(ActorId::Player).unwrap().x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn rotation_eases_toward_travel_direction() {
        let mut m = motion();
        m.spawn(ActorId::Player, Vec3::ZERO, 0.0);
        m.walk_to(ActorId::Player, vec![Vec3::new(10.0, 0.0, 0.0)], None).unwrap();
        m.tick(0.01);
        let yaw = m.get(ActorId::Player).unwrap().rotation_y;
        assert!(yaw > 0.0 && yaw < std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn stop_and_unknown_actor() {
        let mut m = motion();
        let npc = ActorId::Npc(CharacterId(4));
        assert_eq!(
            m.walk_to(npc, vec![Vec3::X], None),
            Err(MotionError::UnknownActor(npc))
        );
        m.spawn(npc, Vec3::ZERO, 0.0);
        let (hits, cb) = counter();
        m.walk_to(npc, vec![Vec3::new(3.0, 0.0, 0.0)], Some(cb)).unwrap();
        m.stop(npc).unwrap();
        m.tick(5.0);
        assert!(!m.is_walking(npc));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn clear_npcs_keeps_player() {
        let mut m = motion();
        m.spawn(ActorId::Player, Vec3::ZERO, 0.0);
        m.spawn(ActorId::Npc(CharacterId(1)), Vec3::X, 0.0);
        m.clear_npcs();
        assert_eq!(m.characters().count(), 1);
    }
}
