//! Screen-space gateways and their activation predicates.
//!
//! A gateway is a rectangle in percent screen coordinates (0..=100 on both
//! axes). It is active when any of its triggers holds; a gateway without
//! triggers is always active. Hit-testing walks the list back to front so the
//! last authored gateway wins on overlap.

use glam::Vec3;

use crate::ids::{ActionId, ClueId, GatewayId, SceneId};
use crate::state::WorldState;

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Edges are inclusive.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// One activation condition.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "condition", rename_all = "kebab-case")]
pub enum TriggerCondition {
    Always,
    Has { clue_id: ClueId },
    HasNot { clue_id: ClueId },
    HasTag { tag: String },
    LacksTag { tag: String },
}

impl TriggerCondition {
    pub fn holds(&self, world: &WorldState) -> bool {
        match self {
            Self::Always => true,
            Self::Has { clue_id } => world.has_clue(*clue_id),
            Self::HasNot { clue_id } => !world.has_clue(*clue_id),
            Self::HasTag { tag } => world.has_tag(tag),
            Self::LacksTag { tag } => !world.has_tag(tag),
        }
    }
}

/// What a gateway does once the player reaches it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayKind {
    Scene {
        target_scene_id: SceneId,
        #[serde(default)]
        target_spawn_point: Option<String>,
    },
    Trigger {
        action_id: ActionId,
    },
    /// Authored without a usable target. Activation only records the click.
    Inert,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Gateway {
    pub id: GatewayId,
    #[serde(default)]
    pub label: String,
    pub kind: GatewayKind,
    pub rect: ScreenRect,
    #[serde(default)]
    pub walk_point: Option<Vec3>,
    #[serde(default)]
    pub triggers: Vec<TriggerCondition>,
}

impl Gateway {
    pub fn is_active(&self, world: &WorldState) -> bool {
        self.triggers.is_empty() || self.triggers.iter().any(|t| t.holds(world))
    }

    pub fn target_spawn_point(&self) -> Option<&str> {
        match &self.kind {
            GatewayKind::Scene {
                target_spawn_point, ..
            } => target_spawn_point.as_deref(),
            _ => None,
        }
    }

    pub fn cursor(&self) -> CursorHint {
        match self.kind {
            GatewayKind::Scene { .. } => CursorHint::Direction,
            _ => CursorHint::Hover,
        }
    }
}

/// Cursor shown while hovering the stage.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CursorHint {
    Pointer,
    Hover,
    Direction,
}

/// Returns the top-most active gateway under the point.
pub fn gateway_at<'a>(gateways: &'a [Gateway], world: &WorldState, x: f32, y: f32) -> Option<&'a Gateway> {
    gateways
        .iter()
        .rev()
        .filter(|gw| gw.is_active(world))
        .find(|gw| gw.rect.contains(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(id: u32, rect: ScreenRect, triggers: Vec<TriggerCondition>) -> Gateway {
        Gateway {
            id: GatewayId(id),
            label: format!("gw{id}"),
            kind: GatewayKind::Trigger {
                action_id: ActionId(id),
            },
            rect,
            walk_point: None,
            triggers,
        }
    }

    #[test]
    fn triggers_combine_with_or() {
        let mut world = WorldState::default();
        let gw = gateway(
            1,
            ScreenRect::new(0.0, 0.0, 10.0, 10.0),
            vec![
                TriggerCondition::Has { clue_id: ClueId(5) },
                TriggerCondition::HasTag { tag: "door_open".into() },
            ],
        );
        assert!(!gw.is_active(&world));
        world.tags.insert("door_open".into());
        assert!(gw.is_active(&world));
    }

    #[test]
    fn has_not_deactivates_once_clue_is_held() {
        let mut world = WorldState::default();
        let gw = gateway(
            1,
            ScreenRect::new(0.0, 0.0, 10.0, 10.0),
            vec![TriggerCondition::HasNot { clue_id: ClueId(2) }],
        );
        assert!(gw.is_active(&world));
        world.inventory.insert(ClueId(2));
        assert!(!gw.is_active(&world));
    }

    #[test]
    fn hit_test_prefers_top_most_active() {
        let mut world = WorldState::default();
        let gateways = vec![
            gateway(1, ScreenRect::new(0.0, 0.0, 50.0, 50.0), vec![]),
            gateway(
                2,
                ScreenRect::new(10.0, 10.0, 20.0, 20.0),
                vec![TriggerCondition::Has { clue_id: ClueId(9) }],
            ),
        ];
        assert_eq!(gateway_at(&gateways, &world, 15.0, 15.0).map(|g| g.id), Some(GatewayId(1)));
        world.inventory.insert(ClueId(9));
        assert_eq!(gateway_at(&gateways, &world, 15.0, 15.0).map(|g| g.id), Some(GatewayId(2)));
        assert!(gateway_at(&gateways, &world, 80.0, 80.0).is_none());
    }
}
