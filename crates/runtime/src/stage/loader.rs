//! Scene geometry sources.

use std::collections::HashMap;

use async_trait::async_trait;
use nexus_core::{MeshGeometry, Scene, SceneId};

use super::SceneError;

/// Produces the named meshes of a scene.
///
/// Meshes whose name mentions `floor`, `walk` or `plane` become the navmesh.
/// Everything else is scenery and is ignored by the runtime.
#[async_trait]
pub trait SceneLoader: Send + Sync {
    async fn load(&self, scene: &Scene) -> Result<Vec<MeshGeometry>, SceneError>;
}

/// Serves the geometry embedded in the scene record itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentSceneLoader;

#[async_trait]
impl SceneLoader for ContentSceneLoader {
    async fn load(&self, scene: &Scene) -> Result<Vec<MeshGeometry>, SceneError> {
        Ok(scene.geometry.clone())
    }
}

/// In-memory geometry keyed by scene, for tests and headless sessions.
#[derive(Debug, Default, Clone)]
pub struct StaticSceneLoader {
    meshes: HashMap<SceneId, Vec<MeshGeometry>>,
    failures: HashMap<SceneId, String>,
}

impl StaticSceneLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scene(mut self, scene: SceneId, meshes: Vec<MeshGeometry>) -> Self {
        self.meshes.insert(scene, meshes);
        self
    }

    /// Makes every load of `scene` fail with `reason`.
    pub fn with_failure(mut self, scene: SceneId, reason: impl Into<String>) -> Self {
        self.failures.insert(scene, reason.into());
        self
    }
}

#[async_trait]
impl SceneLoader for StaticSceneLoader {
    async fn load(&self, scene: &Scene) -> Result<Vec<MeshGeometry>, SceneError> {
        if let Some(reason) = self.failures.get(&scene.id) {
            return Err(SceneError::LoadFailed {
                scene: scene.id,
                reason: reason.clone(),
            });
        }
        Ok(self.meshes.get(&scene.id).cloned().unwrap_or_default())
    }
}
