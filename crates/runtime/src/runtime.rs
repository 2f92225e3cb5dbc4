//! High-level runtime orchestrator.
//!
//! The runtime owns background workers, wires the engine components to one
//! shared session, and exposes a builder-based API for clients to drive it.

use std::sync::Arc;

use nexus_content::{AssetResolver, StorageResolver};
use nexus_core::{Content, EngineConfig, SceneId};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::events::{Event, EventBus, Topic};
use crate::interaction::{InteractionController, ScreenProjector};
use crate::interpreter::{Interpreter, StepExecutor};
use crate::repository::ProfileRepository;
use crate::sequencer::ActionSequencer;
use crate::session::Session;
use crate::stage::{ContentSceneLoader, SceneLoader};
use crate::workers::{PersistenceWorker, TickWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub engine: EngineConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Update loop frequency in Hz. Zero leaves ticking to the handle.
    pub tick_rate: u32,
    /// Save the player profile as the world changes (default: false)
    pub enable_persistence: bool,
    pub profile_id: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            event_buffer_size: 256,
            command_buffer_size: 32,
            tick_rate: 60,
            enable_persistence: false,
            profile_id: "default".to_owned(),
        }
    }
}

/// Owns the workers of one play session.
///
/// Front ends talk to it through the cloneable [`RuntimeHandle`].
pub struct Runtime {
    handle: RuntimeHandle,
    tick_worker_handle: JoinHandle<()>,
    persistence_worker_handle: Option<JoinHandle<()>>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Shutdown the runtime gracefully
    ///
    /// Stops the update loop and lets the persistence worker write a final
    /// profile before returning.
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown_workers().await;
        drop(self.handle);

        self.tick_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        if let Some(persistence) = self.persistence_worker_handle {
            persistence.await.map_err(RuntimeError::WorkerJoin)?;
        }

        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    content: Option<Arc<Content>>,
    loader: Option<Arc<dyn SceneLoader>>,
    assets: Option<Arc<dyn AssetResolver>>,
    repository: Option<Arc<dyn ProfileRepository>>,
    projector: Option<Arc<dyn ScreenProjector>>,
    start_scene: Option<SceneId>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            content: None,
            loader: None,
            assets: None,
            repository: None,
            projector: None,
            start_scene: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the required content snapshot
    pub fn content(mut self, content: impl Into<Arc<Content>>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Scene geometry source. Defaults to the geometry embedded in scenes.
    pub fn scene_loader(mut self, loader: Arc<dyn SceneLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Asset URL resolution. Defaults to the `/storage/` prefix.
    pub fn assets(mut self, assets: Arc<dyn AssetResolver>) -> Self {
        self.assets = Some(assets);
        self
    }

    /// Profile storage; a saved profile for the configured id is restored.
    pub fn repository(mut self, repository: Arc<dyn ProfileRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn projector(mut self, projector: Arc<dyn ScreenProjector>) -> Self {
        self.projector = Some(projector);
        self
    }

    /// Scene to open in, overriding the saved and the configured one.
    pub fn start_scene(mut self, scene: SceneId) -> Self {
        self.start_scene = Some(scene);
        self
    }

    /// Enable profile persistence
    pub fn enable_persistence(mut self, enable: bool) -> Self {
        self.config.enable_persistence = enable;
        self
    }

    /// Build the runtime
    pub async fn build(self) -> Result<Runtime> {
        let content = self.content.ok_or(RuntimeError::MissingContent)?;
        let loader = self
            .loader
            .unwrap_or_else(|| Arc::new(ContentSceneLoader));
        let assets = self
            .assets
            .unwrap_or_else(|| Arc::new(StorageResolver::default()));
        let bus = EventBus::with_capacity(self.config.event_buffer_size);

        let session = Arc::new(Session::new(
            self.config.engine.clone(),
            Arc::clone(&content),
            loader,
            assets,
            bus.clone(),
        ));

        let mut saved_scene = None;
        if let Some(repository) = &self.repository {
            match repository.load(&self.config.profile_id) {
                Ok(Some(profile)) => {
                    info!(target: "nexus::runtime", profile = %profile.id, clues = profile.inventory.len(), "restoring saved profile");
                    session.with_world(|world| profile.apply(world));
                    saved_scene = profile.current_scene_id;
                }
                Ok(None) => {}
                Err(e) => warn!(target: "nexus::runtime", "Failed to load profile {}: {}", self.config.profile_id, e),
            }
        }

        let interpreter = Interpreter::new(Arc::clone(&session));
        let executor: Arc<dyn StepExecutor> = interpreter.clone();
        let sequencer = Arc::new(ActionSequencer::new(
            Arc::clone(&session),
            Arc::clone(&executor),
        ));
        let mut interaction = InteractionController::new(
            Arc::clone(&session),
            executor,
            Arc::clone(&sequencer),
            Arc::clone(interpreter.dialogue()),
        );
        if let Some(projector) = self.projector {
            interaction = interaction.with_projector(projector);
        }

        // Subscribe before the opening scene so its SceneEntered is persisted.
        let persistence = match (&self.repository, self.config.enable_persistence) {
            (Some(repository), true) => Some((Arc::clone(repository), bus.subscribe(Topic::World))),
            (None, true) => {
                warn!(target: "nexus::runtime", "persistence enabled without a repository; profiles will not be saved");
                None
            }
            _ => None,
        };

        let opening = self
            .start_scene
            .or(saved_scene.filter(|id| content.scene(*id).is_some()))
            .or_else(|| content.opening_scene().map(|scene| scene.id));
        match opening {
            Some(scene) => session.enter_scene(scene, None).await?,
            None => warn!(target: "nexus::runtime", "content has no scenes; starting without a stage"),
        }

        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size);
        let tick_worker = TickWorker::new(Arc::clone(&session), self.config.tick_rate, command_rx);
        let tick_worker_handle = tokio::spawn(async move {
            tick_worker.run().await;
        });

        let (persistence_tx, persistence_worker_handle) = match persistence {
            Some((repository, event_rx)) => {
                let (tx, rx) = mpsc::channel(self.config.command_buffer_size);
                let worker = PersistenceWorker::new(
                    Arc::clone(&session),
                    repository,
                    self.config.profile_id.clone(),
                    event_rx,
                    rx,
                );
                let handle = tokio::spawn(async move {
                    worker.run().await;
                });
                (Some(tx), Some(handle))
            }
            None => (None, None),
        };

        let handle = RuntimeHandle::new(
            interpreter,
            sequencer,
            Arc::new(interaction),
            command_tx,
            persistence_tx,
        );

        Ok(Runtime {
            handle,
            tick_worker_handle,
            persistence_worker_handle,
        })
    }
}
