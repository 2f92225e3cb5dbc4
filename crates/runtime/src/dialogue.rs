//! Branching dialogue playback.
//!
//! One dialogue may be open at a time. Entering a node runs its actions and
//! any action it references, then reveals its text one character per interval on a spawned task.
//! Revealing the last character, by timer or by [`DialogueEngine::advance`],
//! exposes the node's choices exactly once; a leaf node instead closes after
//! the leaf hold. Every spawned task carries the instance and generation it
//! was started for and does nothing once either has moved on.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use nexus_core::{
    ActionId, ActiveDialogue, ActorId, AnimationState, Dialogue, DialogueId, DialogueRef, EngineError,
    ErrorKind, NextNode, NodeId, RevealStep, Typewriter,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::events::DialogueEvent;
use crate::interpreter::{StepExecutor, StepOutcome};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DialogueError {
    #[error("dialogue {0:?} does not exist")]
    NotFound(DialogueRef),

    #[error("dialogue {open} is already open")]
    AlreadyOpen { open: DialogueId },

    #[error("no dialogue is open")]
    NotOpen,

    #[error("choices are not exposed yet")]
    ChoicesNotExposed,

    #[error("choice {index} is out of range ({available} available)")]
    InvalidChoice { index: usize, available: usize },
}

impl EngineError for DialogueError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::InvalidState,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "DIALOGUE_NOT_FOUND",
            Self::AlreadyOpen { .. } => "DIALOGUE_ALREADY_OPEN",
            Self::NotOpen => "DIALOGUE_NOT_OPEN",
            Self::ChoicesNotExposed => "DIALOGUE_CHOICES_NOT_EXPOSED",
            Self::InvalidChoice { .. } => "DIALOGUE_INVALID_CHOICE",
        }
    }
}

/// Resolved when a dialogue closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueOutcome {
    pub dialogue: DialogueId,
    /// Node that was showing when the dialogue closed.
    pub last_node: Option<NodeId>,
    /// Indices of the choices taken, in order.
    pub choices: Vec<usize>,
}

/// What a front end needs to draw the dialogue box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueView {
    pub dialogue: DialogueId,
    pub node: NodeId,
    pub visible_text: String,
    /// Present once the choices are exposed.
    pub choices: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Node or choice actions are running.
    Running,
    Revealing,
    Choosing,
    /// Leaf node fully revealed, waiting to close.
    Holding,
}

struct OpenDialogue {
    instance: u64,
    dialogue: Arc<Dialogue>,
    speaker: Option<ActorId>,
    node: NodeId,
    phase: Phase,
    typewriter: Typewriter,
    generation: u64,
    choices: Vec<usize>,
    done: Option<oneshot::Sender<DialogueOutcome>>,
}

impl OpenDialogue {
    fn owner(&self) -> ActorId {
        self.speaker.unwrap_or(ActorId::Player)
    }
}

#[derive(Default)]
struct EngineState {
    open: Option<OpenDialogue>,
    next_instance: u64,
}

enum Advance {
    Revealed {
        instance: u64,
        generation: u64,
        dialogue: DialogueId,
        node: NodeId,
        visible: String,
    },
    Close(u64),
    Nothing,
}

pub struct DialogueEngine {
    session: Arc<Session>,
    executor: Weak<dyn StepExecutor>,
    state: Mutex<EngineState>,
}

impl DialogueEngine {
    pub fn new(session: Arc<Session>, executor: Weak<dyn StepExecutor>) -> Self {
        Self {
            session,
            executor,
            state: Mutex::new(EngineState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_open<R>(&self, instance: u64, f: impl FnOnce(&mut OpenDialogue) -> R) -> Option<R> {
        self.state()
            .open
            .as_mut()
            .filter(|open| open.instance == instance)
            .map(f)
    }

    pub fn is_open(&self) -> bool {
        self.state().open.is_some()
    }

    pub fn view(&self) -> Option<DialogueView> {
        let state = self.state();
        let open = state.open.as_ref()?;
        let choices = (open.phase == Phase::Choosing).then(|| {
            open.dialogue
                .tree
                .node(&open.node)
                .map(|n| n.answers.iter().map(|a| a.text.clone()).collect())
                .unwrap_or_default()
        });
        Some(DialogueView {
            dialogue: open.dialogue.id,
            node: open.node.clone(),
            visible_text: open.typewriter.visible_text(),
            choices,
        })
    }

    /// Opens a dialogue and waits until it closes.
    pub async fn start(
        self: &Arc<Self>,
        key: &DialogueRef,
        speaker: Option<ActorId>,
    ) -> Result<DialogueOutcome, DialogueError> {
        let dialogue = self
            .session
            .content()
            .dialogue(key)
            .cloned()
            .map(Arc::new)
            .ok_or_else(|| DialogueError::NotFound(key.clone()))?;
        let id = dialogue.id;

        let (done_tx, done_rx) = oneshot::channel();
        let instance = {
            let mut state = self.state();
            if let Some(open) = &state.open {
                return Err(DialogueError::AlreadyOpen {
                    open: open.dialogue.id,
                });
            }
            state.next_instance += 1;
            let instance = state.next_instance;
            state.open = Some(OpenDialogue {
                instance,
                dialogue: Arc::clone(&dialogue),
                speaker,
                node: NodeId::new(),
                phase: Phase::Running,
                typewriter: Typewriter::new(""),
                generation: 0,
                choices: Vec::new(),
                done: Some(done_tx),
            });
            instance
        };

        info!(target: "nexus::dialogue", dialogue = %id, title = %dialogue.title, "dialogue opened");
        if let Some(speaker) = speaker
            && let Err(error) = self
                .session
                .with_motion(|motion| motion.set_animation(speaker, AnimationState::Talk))
        {
            debug!(target: "nexus::dialogue", "{error}");
        }
        self.session.publish(DialogueEvent::Opened { dialogue: id, speaker });

        match dialogue.tree.start_node() {
            Some(node) => self.enter_node(instance, node.id.clone()).await,
            None => {
                debug!(target: "nexus::dialogue", dialogue = %id, "dialogue has no nodes");
                self.finish(instance);
            }
        }

        Ok(done_rx.await.unwrap_or_else(|_| DialogueOutcome {
            dialogue: id,
            last_node: None,
            choices: Vec::new(),
        }))
    }

    async fn enter_node(self: &Arc<Self>, instance: u64, node_id: NodeId) {
        let entered = self.with_open(instance, |open| {
            let node = open.dialogue.tree.node(&node_id).cloned()?;
            open.node = node.id.clone();
            open.phase = Phase::Running;
            open.generation += 1;
            open.typewriter = Typewriter::new(&node.text);
            Some((open.dialogue.id, node, open.owner()))
        });
        let Some(entered) = entered else {
            return;
        };
        let Some((dialogue, node, owner)) = entered else {
            warn!(target: "nexus::dialogue", node = %node_id, "choice points at a missing node; closing");
            self.finish(instance);
            return;
        };

        debug!(target: "nexus::dialogue", dialogue = %dialogue, node = %node.id, "entered node");
        self.session.with_world(|world| {
            world.active_dialogue = Some(ActiveDialogue {
                dialogue_id: dialogue,
                node_id: node.id.clone(),
            })
        });
        self.session.publish(DialogueEvent::NodeEntered {
            dialogue,
            node: node.id.clone(),
            text: node.text.clone(),
        });

        if self.run_steps(instance, &node.actions, owner).await
            && self.run_action(instance, node.action_id, owner).await
        {
            self.begin_reveal(instance);
        }
    }

    /// Runs an action referenced by a node or choice as its own sequence.
    ///
    /// An `End` step stops the referenced action, not the dialogue. Returns
    /// `false` once the dialogue has closed underneath it.
    async fn run_action(&self, instance: u64, action_id: Option<ActionId>, owner: ActorId) -> bool {
        let Some(action_id) = action_id else {
            return true;
        };
        let Some(action) = self.session.content().action(action_id).cloned() else {
            warn!(target: "nexus::dialogue", action_id = %action_id, "referenced action does not exist");
            return true;
        };
        let Some(executor) = self.executor.upgrade() else {
            warn!(target: "nexus::dialogue", "step executor is gone; skipping dialogue actions");
            return true;
        };

        self.session
            .log(format!("ACTION TRIGGERED: {}", action.display_name()));
        for step in &action.steps {
            match executor.run(step, owner).await {
                Ok(StepOutcome::Continue) => {}
                Ok(StepOutcome::End) => break,
                Err(error) => {
                    warn!(target: "nexus::dialogue", action_id = %action_id, code = error.error_code(), "{error}; skipping remaining steps");
                    break;
                }
            }
            if self.with_open(instance, |_| ()).is_none() {
                return false;
            }
        }
        self.with_open(instance, |_| ()).is_some()
    }

    /// Runs node or choice actions in order. Returns `false` once the
    /// dialogue has closed underneath them.
    async fn run_steps(&self, instance: u64, steps: &[nexus_core::ActionStep], owner: ActorId) -> bool {
        if steps.is_empty() {
            return true;
        }
        let Some(executor) = self.executor.upgrade() else {
            warn!(target: "nexus::dialogue", "step executor is gone; skipping dialogue actions");
            return true;
        };
        for step in steps {
            match executor.run(step, owner).await {
                Ok(StepOutcome::Continue) => {}
                Ok(StepOutcome::End) => {
                    self.finish(instance);
                    return false;
                }
                Err(error) => {
                    warn!(target: "nexus::dialogue", code = error.error_code(), "{error}; skipping remaining actions");
                    break;
                }
            }
            if self.with_open(instance, |_| ()).is_none() {
                return false;
            }
        }
        self.with_open(instance, |_| ()).is_some()
    }

    fn begin_reveal(self: &Arc<Self>, instance: u64) {
        let Some(generation) = self.with_open(instance, |open| {
            open.phase = Phase::Revealing;
            open.generation
        }) else {
            return;
        };

        let interval = self.session.config().typewriter_interval();
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                sleep(interval).await;
                if !engine.reveal_tick(instance, generation) {
                    break;
                }
            }
        });
    }

    /// One typewriter step. Returns `false` when the task should stop.
    fn reveal_tick(self: &Arc<Self>, instance: u64, generation: u64) -> bool {
        let progress = self
            .with_open(instance, |open| {
                if open.generation != generation || open.phase != Phase::Revealing {
                    return None;
                }
                let step = open.typewriter.advance();
                Some((step, open.typewriter.visible_text(), open.dialogue.id, open.node.clone()))
            })
            .flatten();
        let Some((step, visible, dialogue, node)) = progress else {
            return false;
        };

        self.session.publish(DialogueEvent::TextRevealed {
            dialogue,
            node,
            visible,
        });
        match step {
            RevealStep::Revealed(_) => true,
            RevealStep::Completed => {
                self.reveal_complete(instance, generation);
                false
            }
            RevealStep::AlreadyComplete => false,
        }
    }

    fn reveal_complete(self: &Arc<Self>, instance: u64, generation: u64) {
        let exposed = self
            .with_open(instance, |open| {
                if open.generation != generation {
                    return None;
                }
                let node = open.dialogue.tree.node(&open.node)?;
                if node.is_leaf() {
                    open.phase = Phase::Holding;
                    Some((open.dialogue.id, open.node.clone(), None))
                } else {
                    open.phase = Phase::Choosing;
                    let choices = node.answers.iter().map(|a| a.text.clone()).collect();
                    Some((open.dialogue.id, open.node.clone(), Some(choices)))
                }
            })
            .flatten();

        match exposed {
            Some((dialogue, node, Some(choices))) => {
                self.session.publish(DialogueEvent::ChoicesExposed {
                    dialogue,
                    node,
                    choices,
                });
            }
            Some((_, _, None)) => {
                let hold = self.session.config().leaf_hold();
                let engine = Arc::clone(self);
                tokio::spawn(async move {
                    sleep(hold).await;
                    let holding = engine
                        .with_open(instance, |open| {
                            open.generation == generation && open.phase == Phase::Holding
                        })
                        .unwrap_or(false);
                    if holding {
                        engine.finish(instance);
                    }
                });
            }
            None => {}
        }
    }

    /// Skips the running reveal, or closes a fully revealed leaf node.
    pub fn advance(self: &Arc<Self>) -> Result<(), DialogueError> {
        let next = {
            let mut state = self.state();
            let open = state.open.as_mut().ok_or(DialogueError::NotOpen)?;
            match open.phase {
                Phase::Revealing => match open.typewriter.skip() {
                    RevealStep::Completed => Advance::Revealed {
                        instance: open.instance,
                        generation: open.generation,
                        dialogue: open.dialogue.id,
                        node: open.node.clone(),
                        visible: open.typewriter.visible_text(),
                    },
                    _ => Advance::Nothing,
                },
                Phase::Holding => Advance::Close(open.instance),
                Phase::Running | Phase::Choosing => Advance::Nothing,
            }
        };

        match next {
            Advance::Revealed {
                instance,
                generation,
                dialogue,
                node,
                visible,
            } => {
                self.session.publish(DialogueEvent::TextRevealed {
                    dialogue,
                    node,
                    visible,
                });
                self.reveal_complete(instance, generation);
            }
            Advance::Close(instance) => self.finish(instance),
            Advance::Nothing => {}
        }
        Ok(())
    }

    /// Takes one of the exposed choices, runs its actions and follows it.
    pub async fn select_choice(self: &Arc<Self>, index: usize) -> Result<(), DialogueError> {
        let (instance, choice, owner) = {
            let mut state = self.state();
            let open = state.open.as_mut().ok_or(DialogueError::NotOpen)?;
            if open.phase != Phase::Choosing {
                return Err(DialogueError::ChoicesNotExposed);
            }
            let answers = open
                .dialogue
                .tree
                .node(&open.node)
                .map(|n| n.answers.as_slice())
                .unwrap_or_default();
            let choice = answers
                .get(index)
                .cloned()
                .ok_or(DialogueError::InvalidChoice {
                    index,
                    available: answers.len(),
                })?;
            open.phase = Phase::Running;
            open.generation += 1;
            open.choices.push(index);
            (open.instance, choice, open.owner())
        };

        info!(target: "nexus::dialogue", choice = index, text = %choice.text, "choice selected");
        if !self.run_steps(instance, &choice.actions, owner).await
            || !self.run_action(instance, choice.action_id, owner).await
        {
            return Ok(());
        }
        match choice.next {
            NextNode::Node(next) => self.enter_node(instance, next).await,
            NextNode::End => self.finish(instance),
        }
        Ok(())
    }

    /// Closes whatever dialogue is open.
    pub fn close(&self) {
        let instance = self.state().open.as_ref().map(|open| open.instance);
        if let Some(instance) = instance {
            self.finish(instance);
        }
    }

    /// Closes `instance`. Only the first call for an instance has any effect.
    fn finish(&self, instance: u64) {
        let closed = {
            let mut state = self.state();
            match &state.open {
                Some(open) if open.instance == instance => state.open.take(),
                _ => None,
            }
        };
        let Some(mut open) = closed else {
            return;
        };

        let dialogue = open.dialogue.id;
        if let Some(speaker) = open.speaker {
            let _ = self
                .session
                .with_motion(|motion| motion.set_animation(speaker, AnimationState::Idle));
        }
        self.session.with_world(|world| world.active_dialogue = None);
        self.session.publish(DialogueEvent::Closed { dialogue });
        info!(target: "nexus::dialogue", dialogue = %dialogue, choices = open.choices.len(), "dialogue closed");

        if let Some(done) = open.done.take() {
            let _ = done.send(DialogueOutcome {
                dialogue,
                last_node: (!open.node.is_empty()).then(|| open.node.clone()),
                choices: std::mem::take(&mut open.choices),
            });
        }
    }
}

impl std::fmt::Debug for DialogueEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueEngine")
            .field("open", &self.state().open.as_ref().map(|o| o.dialogue.id))
            .finish()
    }
}
