//! Pointer input on the stage: hovering and clicking gateways and the floor.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use nexus_core::action::params::keys;
use nexus_core::{
    ActionStep, ActorId, CursorHint, EngineError, Gateway, GatewayId, GatewayKind, Scene, StepKind,
    gateway_at,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dialogue::DialogueEngine;
use crate::events::WorldEvent;
use crate::interpreter::StepExecutor;
use crate::sequencer::ActionSequencer;
use crate::session::Session;

/// Maps world positions to screen coordinates in percent of the viewport.
///
/// Only needed to pick the spawnpoint nearest to a gateway click when the
/// gateway has no walk point and the click missed the floor.
pub trait ScreenProjector: Send + Sync {
    fn project(&self, point: Vec3) -> Option<Vec2>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClickOutcome {
    /// A gateway was reached and activated.
    Gateway(GatewayId),
    /// The player walked to a point on the floor.
    Walked(Vec3),
    Ignored,
}

pub struct InteractionController {
    session: Arc<Session>,
    executor: Arc<dyn StepExecutor>,
    sequencer: Arc<ActionSequencer>,
    dialogue: Arc<DialogueEngine>,
    projector: Option<Arc<dyn ScreenProjector>>,
}

impl InteractionController {
    pub fn new(
        session: Arc<Session>,
        executor: Arc<dyn StepExecutor>,
        sequencer: Arc<ActionSequencer>,
        dialogue: Arc<DialogueEngine>,
    ) -> Self {
        Self {
            session,
            executor,
            sequencer,
            dialogue,
            projector: None,
        }
    }

    pub fn with_projector(mut self, projector: Arc<dyn ScreenProjector>) -> Self {
        self.projector = Some(projector);
        self
    }

    fn gateway_under(&self, scene: &Scene, x: f32, y: f32) -> Option<Gateway> {
        self.session
            .with_world(|world| gateway_at(&scene.gateways, world, x, y).cloned())
    }

    /// Cursor for the point, remembering where a scene gateway would land.
    pub fn hover(&self, x: f32, y: f32) -> CursorHint {
        let Some(scene) = self.session.stage().current_scene() else {
            return CursorHint::Pointer;
        };
        match self.gateway_under(&scene, x, y) {
            Some(gateway) => {
                if let Some(spawnpoint) = gateway.target_spawn_point() {
                    self.session
                        .with_world(|world| world.target_spawn_point = Some(spawnpoint.to_owned()));
                }
                gateway.cursor()
            }
            None => CursorHint::Pointer,
        }
    }

    /// Handles a click at screen point `(x, y)`.
    ///
    /// `floor_hit` is where the click ray met the floor, if it did. A click
    /// on a gateway walks the player to it and activates it; any other click
    /// walks the player to the floor point.
    pub async fn click(&self, x: f32, y: f32, floor_hit: Option<Vec3>) -> ClickOutcome {
        if self.dialogue.is_open() {
            debug!(target: "nexus::interaction", "click ignored while a dialogue is open");
            return ClickOutcome::Ignored;
        }
        let Some(scene) = self.session.stage().current_scene() else {
            return ClickOutcome::Ignored;
        };

        let Some(gateway) = self.gateway_under(&scene, x, y) else {
            let Some(hit) = floor_hit else {
                return ClickOutcome::Ignored;
            };
            let point = self.session.stage().snap(hit);
            self.walk_player(point).await;
            return ClickOutcome::Walked(point);
        };

        let approach = gateway
            .walk_point
            .or(floor_hit)
            .or_else(|| self.nearest_spawnpoint(&scene, x, y));
        if let Some(point) = approach {
            self.walk_player(point).await;
        }
        self.activate(&gateway).await;
        ClickOutcome::Gateway(gateway.id)
    }

    fn nearest_spawnpoint(&self, scene: &Scene, x: f32, y: f32) -> Option<Vec3> {
        let projector = self.projector.as_ref()?;
        let click = Vec2::new(x, y);
        scene
            .spawnpoints
            .iter()
            .filter_map(|s| {
                let position = s.position();
                projector
                    .project(position)
                    .map(|screen| (screen.distance_squared(click), position))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, position)| position)
    }

    async fn walk_player(&self, point: Vec3) {
        let step = ActionStep::new(StepKind::WalkTo)
            .param(keys::ACTOR, "player")
            .param(keys::X, point.x)
            .param(keys::Y, point.y)
            .param(keys::Z, point.z);
        if let Err(error) = self.executor.run(&step, ActorId::Player).await {
            warn!(target: "nexus::interaction", "{error}");
        }
    }

    /// Runs what a gateway does, without walking to it first.
    pub async fn activate(&self, gateway: &Gateway) {
        info!(target: "nexus::interaction", gateway = %gateway.id, label = %gateway.label, "gateway activated");
        self.session
            .with_world(|world| world.last_triggered_gateway_id = Some(gateway.id));
        self.session
            .publish(WorldEvent::GatewayActivated { gateway: gateway.id });

        match &gateway.kind {
            GatewayKind::Scene {
                target_scene_id,
                target_spawn_point,
            } => {
                if let Err(error) = self
                    .session
                    .enter_scene(*target_scene_id, target_spawn_point.as_deref())
                    .await
                {
                    warn!(target: "nexus::interaction", code = error.error_code(), "{error}");
                }
            }
            GatewayKind::Trigger { action_id } => {
                if let Err(error) = self.sequencer.trigger(*action_id, ActorId::Player).await {
                    warn!(target: "nexus::interaction", code = error.error_code(), "{error}");
                }
            }
            GatewayKind::Inert => {
                debug!(target: "nexus::interaction", gateway = %gateway.id, "gateway has no target");
            }
        }
    }
}
