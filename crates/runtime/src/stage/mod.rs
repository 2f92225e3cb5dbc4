//! The stage: current scene, its navmesh and the scene loader.
//!
//! Scene changes themselves are orchestrated by
//! [`Session::enter_scene`](crate::session::Session::enter_scene), which also
//! places characters and updates the world state.
mod loader;

pub use loader::{ContentSceneLoader, SceneLoader, StaticSceneLoader};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::Vec3;
use nexus_core::{
    EngineConfig, EngineError, ErrorKind, MeshGeometry, NavMesh, PathError, Pathfinder, Scene,
    SceneId, Spawnpoint,
};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("scene {0} does not exist")]
    NotFound(SceneId),

    #[error("scene {scene} failed to load: {reason}")]
    LoadFailed { scene: SceneId, reason: String },
}

impl EngineError for SceneError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::LoadFailed { .. } => ErrorKind::LoadFailure,
        }
    }
}

struct StageState {
    scene: Option<Scene>,
    pathfinder: Pathfinder,
}

pub struct Stage {
    loader: Arc<dyn SceneLoader>,
    state: Mutex<StageState>,
}

impl Stage {
    pub fn new(loader: Arc<dyn SceneLoader>, config: &EngineConfig) -> Self {
        Self {
            loader,
            state: Mutex::new(StageState {
                scene: None,
                pathfinder: Pathfinder::from_config(config),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, StageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn loader(&self) -> &Arc<dyn SceneLoader> {
        &self.loader
    }

    pub fn current_scene(&self) -> Option<Scene> {
        self.state().scene.clone()
    }

    pub fn current_scene_id(&self) -> Option<SceneId> {
        self.state().scene.as_ref().map(|s| s.id)
    }

    /// Spawnpoint of the current scene by name.
    pub fn spawnpoint(&self, name: &str) -> Option<Spawnpoint> {
        self.state()
            .scene
            .as_ref()
            .and_then(|s| s.spawnpoint(name))
            .cloned()
    }

    pub fn has_nav_mesh(&self) -> bool {
        self.state().pathfinder.has_nav_mesh()
    }

    pub fn nav_generation(&self) -> u64 {
        self.state().pathfinder.generation()
    }

    pub fn find_path(&self, start: Vec3, end: Vec3) -> Result<Vec<Vec3>, PathError> {
        self.state().pathfinder.find_path(start, end)
    }

    /// Nearest walkable point, or `point` itself without a navmesh.
    pub fn snap(&self, point: Vec3) -> Vec3 {
        self.state().pathfinder.closest_point(point)
    }

    /// Makes `scene` current and rebuilds the navmesh from its walkable meshes.
    pub(crate) fn install(&self, scene: Scene, meshes: &[MeshGeometry]) {
        let walkable = meshes.iter().filter(|m| m.is_walkable()).count();
        let nav_mesh = if walkable == 0 {
            None
        } else {
            match NavMesh::from_geometry(meshes) {
                Ok(mesh) => Some(mesh),
                Err(error) => {
                    warn!(target: "nexus::stage", scene = %scene.id, code = error.error_code(), "navmesh rejected: {error}");
                    None
                }
            }
        };

        let mut state = self.state();
        match nav_mesh {
            Some(mesh) => {
                let triangles = mesh.triangle_count();
                let generation = state.pathfinder.set_nav_mesh(mesh);
                debug!(target: "nexus::stage", scene = %scene.id, triangles, generation, "navmesh installed");
            }
            None => {
                state.pathfinder.clear();
                debug!(target: "nexus::stage", scene = %scene.id, "scene has no walkable geometry");
            }
        }
        state.scene = Some(scene);
    }

    /// Drops the current scene and navmesh.
    pub(crate) fn clear(&self) {
        let mut state = self.state();
        state.scene = None;
        state.pathfinder.clear();
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("scene", &self.current_scene_id())
            .field("has_nav_mesh", &self.has_nav_mesh())
            .finish()
    }
}
