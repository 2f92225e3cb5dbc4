//! Cloneable façade over a running session.
//!
//! [`RuntimeHandle`] hides channel plumbing and component wiring and offers
//! async helpers for driving the session or streaming events from specific
//! topics.
use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;
use nexus_core::{
    ActionId, ActionStep, ActorId, ActorRef, CursorHint, DialogueRef, DiscoveryFrame, SceneId,
    WorldState,
};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::errors::{Result, RuntimeError};
use crate::dialogue::{DialogueEngine, DialogueOutcome, DialogueView};
use crate::events::{Event, EventBus, Topic};
use crate::interaction::{ClickOutcome, InteractionController};
use crate::interpreter::{Interpreter, StepExecutor, StepOutcome};
use crate::repository::PlayerProfile;
use crate::sequencer::{ActionSequencer, SequenceReport};
use crate::session::Session;
use crate::workers::{Command, PersistenceCommand};

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    session: Arc<Session>,
    interpreter: Arc<Interpreter>,
    sequencer: Arc<ActionSequencer>,
    interaction: Arc<InteractionController>,
    command_tx: mpsc::Sender<Command>,
    persistence_tx: Option<mpsc::Sender<PersistenceCommand>>,
}

impl RuntimeHandle {
    pub(crate) fn new(
        interpreter: Arc<Interpreter>,
        sequencer: Arc<ActionSequencer>,
        interaction: Arc<InteractionController>,
        command_tx: mpsc::Sender<Command>,
        persistence_tx: Option<mpsc::Sender<PersistenceCommand>>,
    ) -> Self {
        Self {
            session: Arc::clone(interpreter.session()),
            interpreter,
            sequencer,
            interaction,
            command_tx,
            persistence_tx,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn dialogue(&self) -> &Arc<DialogueEngine> {
        self.interpreter.dialogue()
    }

    pub fn sequencer(&self) -> &Arc<ActionSequencer> {
        &self.sequencer
    }

    /// Advance motion and the discovery effect by `dt` seconds right away.
    pub async fn tick(&self, dt: f32) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Step { dt, reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Pause or resume the timer-driven update loop.
    pub async fn set_paused(&self, paused: bool) -> Result<()> {
        self.command_tx
            .send(Command::SetPaused { paused })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    pub async fn enter_scene(&self, scene: SceneId, spawnpoint: Option<&str>) -> Result<()> {
        Ok(self.session.enter_scene(scene, spawnpoint).await?)
    }

    /// Run an action with the player as owner, as a gateway click would.
    pub async fn trigger_action(&self, action_id: ActionId) -> Result<SequenceReport> {
        Ok(self.sequencer.trigger(action_id, ActorId::Player).await?)
    }

    /// Run a single step outside any sequence.
    pub async fn run_step(&self, step: &ActionStep, owner: ActorId) -> Result<StepOutcome> {
        Ok(self.interpreter.run(step, owner).await?)
    }

    /// Open a dialogue, spoken by its own character when it names one, and
    /// wait for it to close.
    pub async fn start_dialogue(&self, dialogue: DialogueRef) -> Result<DialogueOutcome> {
        let speaker = self
            .session
            .content()
            .dialogue(&dialogue)
            .and_then(|d| d.character_id)
            .and_then(|id| {
                self.session
                    .resolve_actor(&ActorRef::Character(id), ActorId::Player)
            });
        Ok(self.dialogue().start(&dialogue, speaker).await?)
    }

    pub async fn select_choice(&self, index: usize) -> Result<()> {
        Ok(self.dialogue().select_choice(index).await?)
    }

    /// Skip the running text reveal, or close a finished leaf node.
    pub fn advance_dialogue(&self) -> Result<()> {
        Ok(self.dialogue().advance()?)
    }

    pub fn dialogue_view(&self) -> Option<DialogueView> {
        self.dialogue().view()
    }

    pub fn hover(&self, x: f32, y: f32) -> CursorHint {
        self.interaction.hover(x, y)
    }

    pub async fn click(&self, x: f32, y: f32, floor_hit: Option<Vec3>) -> ClickOutcome {
        self.interaction.click(x, y, floor_hit).await
    }

    /// Query the current world state (read-only snapshot)
    pub fn world(&self) -> WorldState {
        self.session.world()
    }

    pub fn discovery_frame(&self) -> Option<DiscoveryFrame> {
        self.session.with_discovery(|queue| queue.current_frame())
    }

    /// Reinitialize the session and close any open dialogue.
    pub fn reset(&self) {
        self.dialogue().close();
        self.session.reset();
    }

    /// Save the player profile now.
    pub async fn save_profile(&self) -> Result<PlayerProfile> {
        let tx = self
            .persistence_tx
            .as_ref()
            .ok_or(RuntimeError::PersistenceDisabled)?;
        let (reply_tx, reply_rx) = oneshot::channel();

        tx.send(PersistenceCommand::SaveNow { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        Ok(reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)??)
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::World` - Inventory, tags, scene changes, sequences
    /// - `Topic::Dialogue` - Dialogue lifecycle and text reveal
    /// - `Topic::Motion` - Walk starts and arrivals
    /// - `Topic::Discovery` - Clue discovery effect phases
    /// - `Topic::Debug` - Debug log lines
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.session.events().subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    ///
    /// Returns a map of topic to receiver for each requested topic.
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.session.events().subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        self.session.events()
    }

    pub(crate) async fn shutdown_workers(&self) {
        let _ = self.command_tx.send(Command::Shutdown).await;
        if let Some(tx) = &self.persistence_tx {
            let _ = tx.send(PersistenceCommand::Shutdown).await;
        }
    }
}
