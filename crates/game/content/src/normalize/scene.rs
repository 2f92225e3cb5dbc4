use glam::Vec3;
use nexus_core::{
    ActionId, CharacterId, ClueId, Gateway, GatewayId, GatewayKind, MeshGeometry, NpcPlacement,
    Scene, SceneId, ScreenRect, SectorId, Spawnpoint, TriggerCondition,
};
use serde_json::Value;

use super::{Record, as_number};
use crate::error::{ContentWarning, Diagnostics};

const SPAWNPOINT_KEYS: [&str; 2] = ["3d_spawnpoints", "spawnpoints"];
const GATEWAY_KEYS: [&str; 2] = ["2d_gateways", "gateways"];
const NPC_KEYS: [&str; 3] = ["npcs", "characters", "personages"];
const GEOMETRY_KEYS: [&str; 3] = ["geometry", "navmesh", "meshes"];

/// Normalizes one scene record.
///
/// Scene-level extras (`npcs`, `character_scale`, `geometry`) are read from
/// the top level first, then from the free-form `data` object.
pub fn normalize_scene(raw: &Value, index: usize, diagnostics: &mut Diagnostics) -> Option<Scene> {
    let Some(record) = Record::from_value(raw) else {
        diagnostics.warn(ContentWarning::MalformedRecord {
            collection: "scenes",
            index,
        });
        return None;
    };
    let Some(id) = record.id(&["id"]) else {
        diagnostics.warn(ContentWarning::MissingId {
            collection: "scenes",
            index,
        });
        return None;
    };
    let data = record.object(&["data"]);
    let extra = |keys: &[&str]| record.first(keys).or_else(|| data.and_then(|d| d.first(keys)));

    let mut scene = Scene::new(SceneId(id), record.text(&["title", "name"]).unwrap_or_default());
    scene.sector_id = record
        .id(&["sector_id"])
        .or_else(|| record.object(&["sector"]).and_then(|s| s.id(&["id"])))
        .map(SectorId);

    scene.spawnpoints = record
        .array(&SPAWNPOINT_KEYS)
        .map(|items| items.iter().filter_map(normalize_spawnpoint).collect())
        .unwrap_or_default();

    scene.gateways = record
        .array(&GATEWAY_KEYS)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .filter_map(|(position, item)| normalize_gateway(item, id, position, diagnostics))
                .collect()
        })
        .unwrap_or_default();

    scene.npcs = extra(&NPC_KEYS)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(normalize_npc).collect())
        .unwrap_or_default();

    scene.player_character_id = extra(&["player_character_id", "player_id"])
        .and_then(super::as_id)
        .map(CharacterId);
    scene.character_scale = extra(&["character_scale", "characterScale"])
        .and_then(as_number)
        .filter(|s| *s > 0.0);

    scene.asset = record
        .text(&["model_url", "asset"])
        .or_else(|| scene_model(record));

    scene.geometry = extra(&GEOMETRY_KEYS)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| normalize_geometry(item, id, diagnostics))
                .collect()
        })
        .unwrap_or_default();

    Some(scene)
}

fn normalize_spawnpoint(raw: &Value) -> Option<Spawnpoint> {
    let record = Record::from_value(raw)?;
    let name = record.text(&["name", "label"])?;
    Some(Spawnpoint {
        name,
        x: record.number(&["x"]).unwrap_or(0.0),
        y: record.number(&["y"]).unwrap_or(0.0),
        z: record.number(&["z"]).unwrap_or(0.0),
        direction: record.number(&["direction", "rotation"]),
    })
}

fn normalize_npc(raw: &Value) -> Option<NpcPlacement> {
    let record = Record::from_value(raw)?;
    let character_id = record.id(&["character_id", "personage_id", "id"])?;
    let position = match (record.number(&["x"]), record.number(&["z"])) {
        (Some(x), Some(z)) => Some(Vec3::new(x, record.number(&["y"]).unwrap_or(0.0), z)),
        _ => None,
    };
    Some(NpcPlacement {
        character_id: CharacterId(character_id),
        spawnpoint: record.text(&["spawnpoint", "spawn_point"]),
        position,
        direction: record.number(&["direction"]),
    })
}

fn normalize_gateway(
    raw: &Value,
    scene: u32,
    position: usize,
    diagnostics: &mut Diagnostics,
) -> Option<Gateway> {
    let record = Record::from_value(raw)?;
    // Gateways authored in the editor often lack ids; their position is stable.
    let id = record.id(&["id"]).unwrap_or(position as u32);

    let kind_name = record.text(&["type"]).unwrap_or_default().to_ascii_lowercase();
    let target_scene = record.id(&["target_scene_id", "scene_id"]);
    let action = record.id(&["action_id"]);
    let kind = match (kind_name.as_str(), target_scene, action) {
        ("trigger", _, Some(action)) => GatewayKind::Trigger {
            action_id: ActionId(action),
        },
        ("scene" | "", Some(scene_id), _) => GatewayKind::Scene {
            target_scene_id: SceneId(scene_id),
            target_spawn_point: record
                .text(&["target_spawn_point", "spawnpoint"])
                .filter(|s| !s.trim().is_empty()),
        },
        ("", None, Some(action)) => GatewayKind::Trigger {
            action_id: ActionId(action),
        },
        _ => {
            diagnostics.warn(ContentWarning::InertGateway { scene, gateway: id });
            GatewayKind::Inert
        }
    };

    let walk_point = match (record.number(&["walk_x"]), record.number(&["walk_z"])) {
        (Some(x), Some(z)) => Some(Vec3::new(x, record.number(&["walk_y"]).unwrap_or(0.0), z)),
        _ => None,
    };

    let triggers = record
        .array(&["triggers"])
        .map(|items| {
            items
                .iter()
                .filter_map(|item| normalize_trigger(item, diagnostics))
                .collect()
        })
        .unwrap_or_default();

    Some(Gateway {
        id: GatewayId(id),
        label: record.text(&["label", "name"]).unwrap_or_default(),
        kind,
        rect: ScreenRect::new(
            record.number(&["x"]).unwrap_or(0.0),
            record.number(&["y"]).unwrap_or(0.0),
            record.number(&["width", "w"]).unwrap_or(0.0),
            record.number(&["height", "h"]).unwrap_or(0.0),
        ),
        walk_point,
        triggers,
    })
}

fn normalize_trigger(raw: &Value, diagnostics: &mut Diagnostics) -> Option<TriggerCondition> {
    let record = Record::from_value(raw)?;
    let condition = record.text(&["condition", "type"]).unwrap_or_else(|| "always".into());
    let clue = record.id(&["clue_id", "clue"]).map(ClueId);
    let tag = record.text(&["tag", "game_tag"]);
    let parsed = match (condition.trim().to_ascii_lowercase().replace('_', "-").as_str(), clue, tag) {
        ("always", _, _) => Some(TriggerCondition::Always),
        ("has", Some(clue_id), _) => Some(TriggerCondition::Has { clue_id }),
        ("has-not", Some(clue_id), _) => Some(TriggerCondition::HasNot { clue_id }),
        ("has-tag", _, Some(tag)) => Some(TriggerCondition::HasTag { tag }),
        ("lacks-tag" | "has-not-tag", _, Some(tag)) => Some(TriggerCondition::LacksTag { tag }),
        _ => None,
    };
    if parsed.is_none() {
        diagnostics.warn(ContentWarning::UnknownTriggerCondition { raw: condition });
    }
    parsed
}

/// The scene's 3D media: newest `3d` entry, else the first `.glb` file.
fn scene_model(record: Record<'_>) -> Option<String> {
    let media = record.array(&["media"])?;
    let entries: Vec<Record<'_>> = media.iter().filter_map(Record::from_value).collect();
    entries
        .iter()
        .filter(|m| m.text(&["type"]).as_deref() == Some("3d"))
        .max_by_key(|m| m.id(&["id"]).unwrap_or(0))
        .or_else(|| {
            entries.iter().find(|m| {
                m.text(&["filepad"])
                    .is_some_and(|f| f.to_ascii_lowercase().ends_with(".glb"))
            })
        })
        .and_then(|m| m.text(&["filepad"]))
}

/// Accepts `vertices` as `[[x, y, z], …]` or a flat `[x, y, z, …]` list.
fn normalize_geometry(raw: &Value, scene: u32, diagnostics: &mut Diagnostics) -> Option<MeshGeometry> {
    let record = Record::from_value(raw)?;
    let name = record.text(&["name"]).unwrap_or_else(|| "floor".into());
    let invalid = |diagnostics: &mut Diagnostics| {
        diagnostics.warn(ContentWarning::InvalidGeometry {
            scene,
            mesh: name.clone(),
        });
    };

    let Some(raw_vertices) = record.array(&["vertices", "positions"]) else {
        invalid(diagnostics);
        return None;
    };
    let vertices: Option<Vec<[f32; 3]>> = if raw_vertices.iter().all(Value::is_array) {
        raw_vertices
            .iter()
            .map(|v| {
                let xs = v.as_array()?;
                match xs.as_slice() {
                    [x, y, z] => Some([as_number(x)?, as_number(y)?, as_number(z)?]),
                    _ => None,
                }
            })
            .collect()
    } else if raw_vertices.len() % 3 == 0 {
        raw_vertices
            .chunks(3)
            .map(|c| Some([as_number(&c[0])?, as_number(&c[1])?, as_number(&c[2])?]))
            .collect()
    } else {
        None
    };
    let indices: Option<Vec<u32>> = match record.array(&["indices", "triangles"]) {
        Some(items) => items.iter().map(super::as_id).collect(),
        // Unindexed triangle soup.
        None => vertices
            .as_ref()
            .map(|v| (0..v.len() as u32).collect()),
    };

    match (vertices, indices) {
        (Some(vertices), Some(indices)) if indices.len() % 3 == 0 => Some(MeshGeometry {
            name: name.clone(),
            vertices,
            indices,
        }),
        _ => {
            invalid(diagnostics);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_scene_keys_are_read() {
        let mut diagnostics = Diagnostics::new();
        let raw = json!({
            "id": 1,
            "title": "Harbour",
            "sector_id": "2",
            "3d_spawnpoints": [{ "name": "dock", "x": 1, "y": 0, "z": "2", "direction": 90 }],
            "2d_gateways": [{
                "id": 10, "label": "Boat", "type": "scene",
                "target_scene_id": 2, "target_spawn_point": "deck",
                "x": 10, "y": 20, "width": 5, "height": 5,
                "walk_x": 3, "walk_z": 4,
                "triggers": [{ "condition": "has-not", "clue_id": 7 }]
            }],
            "media": [
                { "id": 1, "type": "2d", "filepad": "scenes/harbour.png" },
                { "id": 2, "type": "3d", "filepad": "scenes/harbour_old.glb" },
                { "id": 5, "type": "3d", "filepad": "scenes/harbour.glb" }
            ],
            "data": { "character_scale": 2.0, "npcs": [{ "character_id": 4, "spawnpoint": "dock" }] }
        });
        let scene = normalize_scene(&raw, 0, &mut diagnostics).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(scene.sector_id, Some(SectorId(2)));
        assert_eq!(scene.spawnpoint("dock").map(Spawnpoint::position), Some(Vec3::new(1.0, 0.0, 2.0)));
        assert_eq!(scene.spawnpoints[0].direction, Some(90.0));

        let gateway = &scene.gateways[0];
        assert_eq!(gateway.target_spawn_point(), Some("deck"));
        assert_eq!(gateway.walk_point, Some(Vec3::new(3.0, 0.0, 4.0)));
        assert_eq!(gateway.triggers, vec![TriggerCondition::HasNot { clue_id: ClueId(7) }]);

        assert_eq!(scene.asset.as_deref(), Some("scenes/harbour.glb"));
        assert_eq!(scene.character_scale, Some(2.0));
        assert_eq!(scene.npcs[0].character_id, CharacterId(4));
    }

    #[test]
    fn trigger_gateway_without_action_is_inert() {
        let mut diagnostics = Diagnostics::new();
        let raw = json!({ "id": 1, "gateways": [{ "type": "trigger", "x": 0, "y": 0 }] });
        let scene = normalize_scene(&raw, 0, &mut diagnostics).unwrap();
        assert_eq!(scene.gateways[0].kind, GatewayKind::Inert);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn flat_geometry_is_accepted() {
        let raw = json!({
            "id": 1,
            "data": { "geometry": [{
                "name": "Floor",
                "vertices": [0, 0, 0, 1, 0, 0, 0, 0, 1],
                "indices": [0, 1, 2]
            }]}
        });
        let scene = normalize_scene(&raw, 0, &mut Diagnostics::new()).unwrap();
        assert_eq!(scene.geometry[0].vertices.len(), 3);
        assert!(scene.geometry[0].is_walkable());
    }
}
