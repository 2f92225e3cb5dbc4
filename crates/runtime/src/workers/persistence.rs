//! Persistence worker that keeps the player profile current.
//!
//! Listens on the world topic and saves a fresh [`PlayerProfile`] whenever
//! the inventory, tags or scene may have changed. Saves that would write the
//! same profile again are skipped. A final save runs on shutdown.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::events::{Event, WorldEvent};
use crate::repository::{PlayerProfile, ProfileRepository, Result};
use crate::session::Session;

/// Commands that can be sent to the persistence worker
pub enum PersistenceCommand {
    /// Save now, even if nothing changed.
    SaveNow {
        reply: oneshot::Sender<Result<PlayerProfile>>,
    },
    /// Shutdown the worker gracefully
    Shutdown,
}

pub struct PersistenceWorker {
    session: Arc<Session>,
    repository: Arc<dyn ProfileRepository>,
    profile_id: String,
    event_rx: broadcast::Receiver<Event>,
    command_rx: mpsc::Receiver<PersistenceCommand>,
    last_saved: Option<PlayerProfile>,
}

fn touches_profile(event: &WorldEvent) -> bool {
    matches!(
        event,
        WorldEvent::ClueGranted { .. }
            | WorldEvent::TagSet { .. }
            | WorldEvent::TagRemoved { .. }
            | WorldEvent::SceneEntered { .. }
            | WorldEvent::SessionReset
    )
}

impl PersistenceWorker {
    pub fn new(
        session: Arc<Session>,
        repository: Arc<dyn ProfileRepository>,
        profile_id: impl Into<String>,
        event_rx: broadcast::Receiver<Event>,
        command_rx: mpsc::Receiver<PersistenceCommand>,
    ) -> Self {
        Self {
            session,
            repository,
            profile_id: profile_id.into(),
            event_rx,
            command_rx,
            last_saved: None,
        }
    }

    /// Main worker loop
    pub async fn run(mut self) {
        info!(target: "nexus::persistence", profile = %self.profile_id, "PersistenceWorker started");

        loop {
            tokio::select! {
                event = self.event_rx.recv() => match event {
                    Ok(Event::World(event)) if touches_profile(&event) => self.save_if_changed(),
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(target: "nexus::persistence", skipped, "world events lagged; saving current state");
                        self.save_if_changed();
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!(target: "nexus::persistence", "Event bus closed, shutting down PersistenceWorker");
                        break;
                    }
                },
                cmd = self.command_rx.recv() => match cmd {
                    Some(PersistenceCommand::SaveNow { reply }) => {
                        let _ = reply.send(self.save());
                    }
                    Some(PersistenceCommand::Shutdown) => {
                        info!(target: "nexus::persistence", "Shutdown command received");
                        break;
                    }
                    None => {
                        debug!(target: "nexus::persistence", "Command channel closed");
                        break;
                    }
                },
            }
        }

        self.save_if_changed();
        info!(target: "nexus::persistence", "PersistenceWorker stopped");
    }

    fn save(&mut self) -> Result<PlayerProfile> {
        let profile = PlayerProfile::capture(&self.profile_id, &self.session.world());
        self.repository.save(&profile)?;
        self.last_saved = Some(profile.clone());
        Ok(profile)
    }

    fn save_if_changed(&mut self) {
        let world = self.session.world();
        if self.last_saved.as_ref().is_some_and(|p| p.matches(&world)) {
            return;
        }
        if let Err(e) = self.save() {
            error!(target: "nexus::persistence", "Failed to save profile {}: {}", self.profile_id, e);
        }
    }
}
