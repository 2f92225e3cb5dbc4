use glam::Vec3;

use crate::ids::ActorId;

/// Opaque handle to the renderer's mesh for a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct MeshHandle(pub u64);

/// Animation a character is playing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationState {
    #[default]
    Idle,
    Walk,
    Talk,
    Caution,
    /// A one-shot clip played by name.
    Clip(String),
}

impl AnimationState {
    /// Classifies an authored clip name.
    ///
    /// `walk`/`loop`/`run` map to [`Walk`](Self::Walk), `idle`/`stand`/`breath`
    /// to [`Idle`](Self::Idle), `talk`/`speak`/`chat` to [`Talk`](Self::Talk)
    /// and `caut`/`sneak`/`crouch` to [`Caution`](Self::Caution). Anything else
    /// is played as a named clip.
    pub fn from_clip_name(name: &str) -> Self {
        let lower = name.trim().to_ascii_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));
        if has(&["walk", "loop", "run"]) {
            Self::Walk
        } else if has(&["idle", "stand", "breath"]) {
            Self::Idle
        } else if has(&["talk", "speak", "chat"]) {
            Self::Talk
        } else if has(&["caut", "sneak", "crouch"]) {
            Self::Caution
        } else {
            Self::Clip(name.trim().to_owned())
        }
    }
}

/// Runtime record of one character in the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Character {
    pub id: ActorId,
    pub mesh: Option<MeshHandle>,
    pub position: Vec3,
    /// Facing around the Y axis, radians. Zero faces +Z.
    pub rotation_y: f32,
    pub path: Vec<Vec3>,
    pub path_index: usize,
    pub is_walking: bool,
    pub animation: AnimationState,
    /// Walk speed in units per second before scene scaling.
    pub speed: f32,
}

impl Character {
    pub fn new(id: ActorId, position: Vec3, rotation_y: f32, speed: f32) -> Self {
        Self {
            id,
            mesh: None,
            position,
            rotation_y,
            path: Vec::new(),
            path_index: 0,
            is_walking: false,
            animation: AnimationState::Idle,
            speed,
        }
    }

    /// Waypoint currently being approached.
    pub fn current_target(&self) -> Option<Vec3> {
        self.path.get(self.path_index).copied()
    }

    /// Final waypoint of the current path.
    pub fn destination(&self) -> Option<Vec3> {
        if self.is_walking {
            self.path.last().copied()
        } else {
            None
        }
    }
}

/// Yaw that faces `to` from `from`, or `None` when the points coincide on XZ.
pub fn yaw_towards(from: Vec3, to: Vec3) -> Option<f32> {
    let dx = to.x - from.x;
    let dz = to.z - from.z;
    if dx.abs() <= f32::EPSILON && dz.abs() <= f32::EPSILON {
        None
    } else {
        Some(dx.atan2(dz))
    }
}

/// Signed shortest rotation from `from` to `to`, in `[-PI, PI]`.
pub fn shortest_arc(from: f32, to: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let mut delta = (to - from) % TAU;
    if delta > PI {
        delta -= TAU;
    } else if delta < -PI {
        delta += TAU;
    }
    delta
}
