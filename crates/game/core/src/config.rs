use std::time::Duration;

/// Engine tunables shared by the motion system, the interpreter and the
/// dialogue engine.
///
/// None of these values are correctness properties; they shape how the world
/// feels. Defaults match the values the content was authored against.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Linear walk speed in world units per second before scene scaling.
    pub walk_speed: f32,
    /// Per-scene character scale factor applied to walk speed.
    pub character_scale: f32,
    /// Distance below which a waypoint counts as reached.
    pub arrival_epsilon: f32,
    /// Rotation easing rate (fraction of the remaining arc per second).
    pub turn_rate: f32,
    /// Maximum vertical distance between a point and the navmesh surface for
    /// the point to count as walkable.
    pub navmesh_vertical_tolerance: f32,
    /// Pause after an instantaneous look-at so the turn reads on screen.
    pub look_at_settle_ms: u64,
    /// Idle wait used when a step carries no parseable duration.
    pub default_wait_secs: f32,
    /// Hold time after triggering a one-shot animation clip.
    pub animation_hold_ms: u64,
    /// Delay between two revealed characters of dialogue text.
    pub typewriter_interval_ms: u64,
    /// How long a fully revealed leaf node stays open before closing.
    pub leaf_hold_ms: u64,
    /// Number of debug lines retained in the world state.
    pub debug_log_capacity: usize,
    /// Default facing (degrees) for spawnpoints without a direction.
    pub default_spawn_direction: f32,
}

impl EngineConfig {
    pub const DEFAULT_WALK_SPEED: f32 = 1.5;
    pub const DEFAULT_CHARACTER_SCALE: f32 = 1.5;
    pub const DEFAULT_ARRIVAL_EPSILON: f32 = 0.1;
    pub const DEFAULT_TURN_RATE: f32 = 10.0;
    pub const DEFAULT_VERTICAL_TOLERANCE: f32 = 0.5;
    pub const DEFAULT_LOOK_AT_SETTLE_MS: u64 = 300;
    pub const DEFAULT_WAIT_SECS: f32 = 1.0;
    pub const DEFAULT_ANIMATION_HOLD_MS: u64 = 500;
    pub const DEFAULT_TYPEWRITER_INTERVAL_MS: u64 = 30;
    pub const DEFAULT_LEAF_HOLD_MS: u64 = 2_000;
    pub const DEFAULT_DEBUG_LOG_CAPACITY: usize = 6;
    pub const DEFAULT_SPAWN_DIRECTION: f32 = 180.0;

    pub fn new() -> Self {
        Self {
            walk_speed: Self::DEFAULT_WALK_SPEED,
            character_scale: Self::DEFAULT_CHARACTER_SCALE,
            arrival_epsilon: Self::DEFAULT_ARRIVAL_EPSILON,
            turn_rate: Self::DEFAULT_TURN_RATE,
            navmesh_vertical_tolerance: Self::DEFAULT_VERTICAL_TOLERANCE,
            look_at_settle_ms: Self::DEFAULT_LOOK_AT_SETTLE_MS,
            default_wait_secs: Self::DEFAULT_WAIT_SECS,
            animation_hold_ms: Self::DEFAULT_ANIMATION_HOLD_MS,
            typewriter_interval_ms: Self::DEFAULT_TYPEWRITER_INTERVAL_MS,
            leaf_hold_ms: Self::DEFAULT_LEAF_HOLD_MS,
            debug_log_capacity: Self::DEFAULT_DEBUG_LOG_CAPACITY,
            default_spawn_direction: Self::DEFAULT_SPAWN_DIRECTION,
        }
    }

    /// Effective walk speed once the scene's character scale is applied.
    pub fn scaled_walk_speed(&self) -> f32 {
        self.walk_speed * self.character_scale
    }

    pub fn look_at_settle(&self) -> Duration {
        Duration::from_millis(self.look_at_settle_ms)
    }

    pub fn animation_hold(&self) -> Duration {
        Duration::from_millis(self.animation_hold_ms)
    }

    pub fn typewriter_interval(&self) -> Duration {
        Duration::from_millis(self.typewriter_interval_ms.max(1))
    }

    /// Idle wait fallback; a negative or oversized setting uses the default.
    pub fn default_wait(&self) -> Duration {
        Duration::try_from_secs_f32(self.default_wait_secs)
            .unwrap_or(Duration::from_secs_f32(Self::DEFAULT_WAIT_SECS))
    }

    pub fn leaf_hold(&self) -> Duration {
        Duration::from_millis(self.leaf_hold_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
