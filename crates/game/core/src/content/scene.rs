use glam::Vec3;

use crate::gateway::Gateway;
use crate::ids::{CharacterId, SceneId, SectorId};

/// Named walk target with a facing direction in degrees.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Spawnpoint {
    pub name: String,
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    pub z: f32,
    #[serde(default)]
    pub direction: Option<f32>,
}

impl Spawnpoint {
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            x: position.x,
            y: position.y,
            z: position.z,
            direction: None,
        }
    }

    pub fn facing(mut self, degrees: f32) -> Self {
        self.direction = Some(degrees);
        self
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// NPC placed in a scene at load.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NpcPlacement {
    pub character_id: CharacterId,
    #[serde(default)]
    pub spawnpoint: Option<String>,
    #[serde(default)]
    pub position: Option<Vec3>,
    #[serde(default)]
    pub direction: Option<f32>,
}

/// Triangle geometry of one named mesh, already in world space.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MeshGeometry {
    pub name: String,
    pub vertices: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshGeometry {
    pub const WALKABLE_MARKERS: [&'static str; 3] = ["floor", "walk", "plane"];

    /// A mesh is walkable when its name mentions floor, walk or plane.
    pub fn is_walkable(&self) -> bool {
        let name = self.name.to_ascii_lowercase();
        Self::WALKABLE_MARKERS.iter().any(|m| name.contains(m))
    }

    pub fn positions(&self) -> Vec<Vec3> {
        self.vertices.iter().map(|v| Vec3::from_array(*v)).collect()
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    pub id: SceneId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sector_id: Option<SectorId>,
    #[serde(default)]
    pub spawnpoints: Vec<Spawnpoint>,
    #[serde(default)]
    pub gateways: Vec<Gateway>,
    #[serde(default)]
    pub npcs: Vec<NpcPlacement>,
    /// Character the player controls in this scene, if authored.
    #[serde(default)]
    pub player_character_id: Option<CharacterId>,
    #[serde(default)]
    pub character_scale: Option<f32>,
    /// Relative path of the scene's 3D asset.
    #[serde(default)]
    pub asset: Option<String>,
    /// Embedded geometry, used when no external scene loader is configured.
    #[serde(default)]
    pub geometry: Vec<MeshGeometry>,
}

impl Scene {
    pub fn new(id: SceneId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            sector_id: None,
            spawnpoints: Vec::new(),
            gateways: Vec::new(),
            npcs: Vec::new(),
            player_character_id: None,
            character_scale: None,
            asset: None,
            geometry: Vec::new(),
        }
    }

    /// Exact name match first, then case-insensitive.
    pub fn spawnpoint(&self, name: &str) -> Option<&Spawnpoint> {
        self.spawnpoints
            .iter()
            .find(|sp| sp.name == name)
            .or_else(|| self.spawnpoints.iter().find(|sp| sp.name.eq_ignore_ascii_case(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walkable_meshes_are_named_by_convention() {
        let mesh = |name: &str| MeshGeometry {
            name: name.into(),
            ..MeshGeometry::default()
        };
        assert!(mesh("Floor_01").is_walkable());
        assert!(mesh("walkway").is_walkable());
        assert!(mesh("GroundPlane").is_walkable());
        assert!(!mesh("Wall").is_walkable());
    }

    #[test]
    fn spawnpoint_lookup_falls_back_to_case_insensitive() {
        let mut scene = Scene::new(SceneId(1), "dock");
        scene.spawnpoints.push(Spawnpoint::new("Dock", Vec3::new(1.0, 0.0, 2.0)));
        assert!(scene.spawnpoint("dock").is_some());
        assert!(scene.spawnpoint("pier").is_none());
    }
}
