//! Time-boxed clue discovery effect.
//!
//! A discovery shows the clue's model in front of the camera for four
//! seconds: it grows, holds, rotates and shrinks away. Each clue is shown at
//! most once per session. Discoveries that arrive while one is playing wait
//! in a queue.

use std::collections::{HashSet, VecDeque};

use crate::ids::ClueId;

/// Phase boundaries, seconds since the effect started.
pub const GROW_END: f32 = 1.0;
pub const HOLD_END: f32 = 1.5;
pub const ROTATE_END: f32 = 3.0;
pub const DURATION: f32 = 4.0;

const SPIN_Y_RATE: f32 = 2.0;
const SPIN_Z_RATE: f32 = 0.5;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryPhase {
    Grow,
    Hold,
    Rotate,
    Shrink,
    Done,
}

impl DiscoveryPhase {
    pub fn at(elapsed: f32) -> Self {
        if elapsed < GROW_END {
            Self::Grow
        } else if elapsed < HOLD_END {
            Self::Hold
        } else if elapsed < ROTATE_END {
            Self::Rotate
        } else if elapsed < DURATION {
            Self::Shrink
        } else {
            Self::Done
        }
    }
}

/// Render state of the effect at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiscoveryFrame {
    pub clue: ClueId,
    pub phase: DiscoveryPhase,
    pub scale: f32,
    pub spin_y: f32,
    pub spin_z: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DiscoveryEffect {
    pub clue: ClueId,
    /// Resolved URL of the clue's 3D model; `None` renders the fallback mesh.
    pub model_url: Option<String>,
    elapsed: f32,
}

impl DiscoveryEffect {
    pub fn new(clue: ClueId, model_url: Option<String>) -> Self {
        Self {
            clue,
            model_url,
            elapsed: 0.0,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn phase(&self) -> DiscoveryPhase {
        DiscoveryPhase::at(self.elapsed)
    }

    pub fn is_finished(&self) -> bool {
        self.phase() == DiscoveryPhase::Done
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(DURATION);
    }

    pub fn frame(&self) -> DiscoveryFrame {
        let t = self.elapsed;
        let scale = match self.phase() {
            DiscoveryPhase::Grow => t / GROW_END,
            DiscoveryPhase::Hold | DiscoveryPhase::Rotate => 1.0,
            DiscoveryPhase::Shrink | DiscoveryPhase::Done => (1.0 - (t - ROTATE_END)).max(0.0),
        };
        DiscoveryFrame {
            clue: self.clue,
            phase: self.phase(),
            scale,
            spin_y: t * SPIN_Y_RATE,
            spin_z: t * SPIN_Z_RATE,
        }
    }
}

/// Observable change produced by [`DiscoveryQueue::tick`].
#[derive(Clone, Debug, PartialEq)]
pub enum DiscoveryUpdate {
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

#[derive(Clone, Debug, Default)]
pub struct DiscoveryQueue {
    shown: HashSet<ClueId>,
    waiting: VecDeque<DiscoveryEffect>,
    active: Option<DiscoveryEffect>,
}

impl DiscoveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a discovery. Returns `false` if this clue was already shown or
    /// queued this session.
    pub fn enqueue(&mut self, clue: ClueId, model_url: Option<String>) -> bool {
        if !self.shown.insert(clue) {
            return false;
        }
        self.waiting.push_back(DiscoveryEffect::new(clue, model_url));
        true
    }

    pub fn active(&self) -> Option<&DiscoveryEffect> {
        self.active.as_ref()
    }

    pub fn current_frame(&self) -> Option<DiscoveryFrame> {
        self.active.as_ref().map(DiscoveryEffect::frame)
    }

    pub fn pending(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.waiting.is_empty()
    }

    pub fn was_shown(&self, clue: ClueId) -> bool {
        self.shown.contains(&clue)
    }

    /// Forgets every shown clue. Used on session reset.
    pub fn reset(&mut self) {
        self.shown.clear();
        self.waiting.clear();
        self.active = None;
    }

    pub fn tick(&mut self, dt: f32) -> Vec<DiscoveryUpdate> {
        let mut updates = Vec::new();
        if self.active.is_none() {
            if let Some(next) = self.waiting.pop_front() {
                updates.push(DiscoveryUpdate::Started {
                    clue: next.clue,
                    model_url: next.model_url.clone(),
                });
                self.active = Some(next);
                return updates;
            }
            return updates;
        }

        if let Some(effect) = self.active.as_mut() {
            let before = effect.phase();
            effect.advance(dt);
            let after = effect.phase();
            if after != before {
                updates.push(DiscoveryUpdate::PhaseChanged {
                    clue: effect.clue,
                    phase: after,
                });
            }
            if effect.is_finished() {
                updates.push(DiscoveryUpdate::Finished { clue: effect.clue });
                self.active = None;
            }
        }
        updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_follow_the_timeline() {
        assert_eq!(DiscoveryPhase::at(0.0), DiscoveryPhase::Grow);
        assert_eq!(DiscoveryPhase::at(1.2), DiscoveryPhase::Hold);
        assert_eq!(DiscoveryPhase::at(2.0), DiscoveryPhase::Rotate);
        assert_eq!(DiscoveryPhase::at(3.5), DiscoveryPhase::Shrink);
        assert_eq!(DiscoveryPhase::at(4.0), DiscoveryPhase::Done);
    }

    #[test]
    fn scale_grows_then_shrinks() {
        let mut effect = DiscoveryEffect::new(ClueId(1), None);
        effect.advance(0.5);
        assert!((effect.frame().scale - 0.5).abs() < 1e-6);
        effect.advance(1.5);
        assert_eq!(effect.frame().scale, 1.0);
        effect.advance(1.5);
        assert!((effect.frame().scale - 0.5).abs() < 1e-5);
        effect.advance(5.0);
        assert_eq!(effect.frame().scale, 0.0);
        assert!(effect.is_finished());
    }

    #[test]
    fn each_clue_is_shown_once() {
        let mut queue = DiscoveryQueue::new();
        assert!(queue.enqueue(ClueId(7), None));
        assert!(!queue.enqueue(ClueId(7), None));
        assert_eq!(queue.pending(), 1);
    }

    #[test]
    fn overlapping_discoveries_play_in_order() {
        let mut queue = DiscoveryQueue::new();
        queue.enqueue(ClueId(1), Some("/storage/a.glb".into()));
        queue.enqueue(ClueId(2), None);

        let started = queue.tick(0.016);
        assert_eq!(
            started,
            vec![DiscoveryUpdate::Started {
                clue: ClueId(1),
                model_url: Some("/storage/a.glb".into())
            }]
        );

        let mut finished = Vec::new();
        for _ in 0..600 {
            for update in queue.tick(0.016) {
                if let DiscoveryUpdate::Finished { clue } = update {
                    finished.push(clue);
                }
            }
        }
        assert_eq!(finished, vec![ClueId(1), ClueId(2)]);
        assert!(queue.is_idle());
    }
}
