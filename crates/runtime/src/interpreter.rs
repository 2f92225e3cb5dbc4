//! Executes one [`ActionStep`] against the session.
//!
//! The [`Interpreter`] is the only step executor the engine ships. The action
//! sequencer and the dialogue engine both reach it through the
//! [`StepExecutor`] trait, which lets tests substitute their own executor.
//!
//! Failures inside a step are logged and the step resolves; only a scene
//! that fails to load is reported back to the caller, because it leaves the
//! stage in a state the remaining steps cannot rely on.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use glam::Vec3;
use nexus_core::action::params::keys;
use nexus_core::{
    ActionStep, ActorId, ActorRef, AnimationState, EngineError, ErrorKind, PathError, StepKind,
    StepParams,
};
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};
use tracing::{debug, trace, warn};

use crate::dialogue::{DialogueEngine, DialogueError};
use crate::events::MotionEvent;
use crate::session::Session;
use crate::stage::SceneError;

/// How the enclosing sequence should proceed after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    /// The step was an `End`; stop the sequence here.
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error("scene change failed: {0}")]
    SceneLoad(#[from] SceneError),
}

impl EngineError for StepError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::SceneLoad(inner) => inner.kind(),
        }
    }
}

#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn run(&self, step: &ActionStep, owner: ActorId) -> Result<StepOutcome, StepError>;
}

pub struct Interpreter {
    session: Arc<Session>,
    dialogue: Arc<DialogueEngine>,
}

impl Interpreter {
    /// Builds the interpreter together with the dialogue engine it drives.
    ///
    /// The dialogue engine runs node and choice actions through this
    /// interpreter, so it only keeps a weak reference back to it.
    pub fn new(session: Arc<Session>) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Interpreter>| {
            let executor: Weak<dyn StepExecutor> = weak.clone();
            let dialogue = Arc::new(DialogueEngine::new(Arc::clone(&session), executor));
            Self { session, dialogue }
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn dialogue(&self) -> &Arc<DialogueEngine> {
        &self.dialogue
    }

    fn actor(&self, params: &StepParams, owner: ActorId) -> Option<ActorId> {
        self.session.resolve_actor(&params.actor(), owner)
    }

    async fn walk_to(&self, params: &StepParams, owner: ActorId) {
        let Some(actor) = self.actor(params, owner) else {
            return;
        };

        let named = params.text(keys::SPAWNPOINT).and_then(|name| {
            let found = self.session.stage().spawnpoint(&name);
            if found.is_none() {
                warn!(target: "nexus::action", spawnpoint = %name, "spawnpoint not in current scene");
            }
            found
        });
        let literal = match (params.number(keys::X), params.number(keys::Z)) {
            (Some(x), Some(z)) => Some(Vec3::new(x, params.number(keys::Y).unwrap_or(0.0), z)),
            _ => None,
        };
        let Some((target, direction)) = named
            .map(|s| (s.position(), s.direction))
            .or(literal.map(|p| (p, None)))
        else {
            warn!(target: "nexus::action", actor = %actor, "walk step has no target");
            return;
        };

        let Some(start) = self.session.with_motion(|motion| motion.position(actor)) else {
            warn!(target: "nexus::action", actor = %actor, "walking character is not spawned");
            return;
        };

        let path = match self.session.stage().find_path(start, target) {
            Ok(path) => path,
            Err(PathError::NoNavMesh) => vec![start, target],
            Err(error) => {
                warn!(target: "nexus::path", actor = %actor, code = error.error_code(), "{error}");
                return;
            }
        };
        let waypoints = path.len();

        let (arrived_tx, arrived_rx) = oneshot::channel();
        let started = self.session.with_motion(|motion| {
            motion.walk_to(
                actor,
                path,
                Some(Box::new(move || {
                    let _ = arrived_tx.send(());
                })),
            )
        });
        if let Err(error) = started {
            warn!(target: "nexus::action", "{error}");
            return;
        }
        self.session.publish(MotionEvent::WalkStarted {
            actor,
            destination: target,
            waypoints,
        });

        match arrived_rx.await {
            Ok(()) => {
                if let Some(degrees) = direction {
                    let _ = self
                        .session
                        .with_motion(|motion| motion.face(actor, degrees.to_radians()));
                }
            }
            Err(_) => debug!(target: "nexus::action", actor = %actor, "walk superseded before arrival"),
        }
    }

    async fn look_at(&self, params: &StepParams, owner: ActorId) {
        let subject = self.actor(params, owner);
        let target = self.session.resolve_actor(&params.target(), owner);
        let (Some(subject), Some(target)) = (subject, target) else {
            return;
        };

        let faced = self.session.with_motion(|motion| {
            let point = motion.position(target)?;
            Some(motion.face_towards(subject, point))
        });
        match faced {
            Some(Ok(_)) => sleep(self.session.config().look_at_settle()).await,
            Some(Err(error)) => warn!(target: "nexus::action", "{error}"),
            None => warn!(target: "nexus::action", target = %target, "look-at target is not spawned"),
        }
    }

    async fn idle_wait(&self, params: &StepParams) {
        let requested = params.number(keys::DURATION).filter(|s| *s >= 0.0);
        let duration = requested
            .and_then(|seconds| match Duration::try_from_secs_f32(seconds) {
                Ok(duration) => Some(duration),
                Err(error) => {
                    warn!(target: "nexus::action", seconds, "wait duration out of range, using the default: {error}");
                    None
                }
            })
            .unwrap_or_else(|| self.session.config().default_wait());
        trace!(target: "nexus::action", ?duration, "waiting");
        sleep(duration).await;
    }

    async fn start_dialogue(&self, params: &StepParams, owner: ActorId) {
        let Some(key) = params.dialogue() else {
            warn!(target: "nexus::action", "dialogue step names no dialogue");
            return;
        };

        // An explicit actor speaks, else an NPC owner, else the dialogue's
        // own character, else the player who owns the sequence.
        let speaker = if params.contains(keys::ACTOR) {
            self.actor(params, owner)
        } else if matches!(owner, ActorId::Npc(_)) {
            Some(owner)
        } else {
            self.session
                .content()
                .dialogue(&key)
                .and_then(|d| d.character_id)
                .and_then(|id| self.session.resolve_actor(&ActorRef::Character(id), owner))
                .or(Some(owner))
        };

        match self.dialogue.start(&key, speaker).await {
            Ok(outcome) => {
                debug!(target: "nexus::action", dialogue = %outcome.dialogue, choices = outcome.choices.len(), "dialogue finished")
            }
            Err(error @ (DialogueError::NotFound(_) | DialogueError::AlreadyOpen { .. })) => {
                warn!(target: "nexus::action", code = error.error_code(), "{error}")
            }
            Err(error) => warn!(target: "nexus::action", "{error}"),
        }
    }

    fn give_clue(&self, params: &StepParams) {
        match params.clue() {
            Some(clue) => {
                self.session.grant_clue(clue);
            }
            None => warn!(target: "nexus::action", "clue step names no clue"),
        }
    }

    async fn goto_scene(&self, params: &StepParams) -> Result<(), StepError> {
        let Some(scene) = params.scene() else {
            warn!(target: "nexus::action", "scene step names no scene");
            return Ok(());
        };
        let spawnpoint = params.text(keys::SPAWNPOINT);
        match self.session.enter_scene(scene, spawnpoint.as_deref()).await {
            Ok(()) => Ok(()),
            Err(SceneError::NotFound(id)) => {
                warn!(target: "nexus::action", scene = %id, "scene does not exist");
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn play_animation(&self, params: &StepParams, owner: ActorId) {
        let Some(actor) = self.actor(params, owner) else {
            return;
        };
        let Some(clip) = params.text(keys::ANIMATION) else {
            warn!(target: "nexus::action", "animation step names no clip");
            return;
        };
        let animation = AnimationState::from_clip_name(&clip);
        match self
            .session
            .with_motion(|motion| motion.set_animation(actor, animation))
        {
            Ok(()) => sleep(self.session.config().animation_hold()).await,
            Err(error) => warn!(target: "nexus::action", "{error}"),
        }
    }

    fn tag(&self, params: &StepParams, set: bool) {
        let Some(tag) = params.text(keys::TAG) else {
            warn!(target: "nexus::action", "tag step names no tag");
            return;
        };
        if set {
            self.session.set_tag(&tag);
        } else {
            self.session.remove_tag(&tag);
        }
    }
}

#[async_trait]
impl StepExecutor for Interpreter {
    async fn run(&self, step: &ActionStep, owner: ActorId) -> Result<StepOutcome, StepError> {
        trace!(target: "nexus::action", kind = %step.kind.as_str(), owner = %owner, "running step");
        let params = &step.params;
        match &step.kind {
            StepKind::WalkTo => self.walk_to(params, owner).await,
            StepKind::LookAt => self.look_at(params, owner).await,
            StepKind::IdleWait => self.idle_wait(params).await,
            StepKind::StartDialogue => self.start_dialogue(params, owner).await,
            StepKind::GiveClue => self.give_clue(params),
            StepKind::GotoScene => self.goto_scene(params).await?,
            StepKind::PlayAnimation => self.play_animation(params, owner).await,
            StepKind::SetTag => self.tag(params, true),
            StepKind::RemoveTag => self.tag(params, false),
            StepKind::End => return Ok(StepOutcome::End),
            StepKind::Unknown(raw) => {
                warn!(target: "nexus::action", kind = %raw, "unknown step kind; skipping");
            }
        }
        Ok(StepOutcome::Continue)
    }
}
