//! In-memory ProfileRepository implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{PlayerProfile, ProfileRepository, RepositoryError, Result};

#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: RwLock<HashMap<String, PlayerProfile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: PlayerProfile) -> Self {
        let repo = Self::new();
        if let Ok(mut profiles) = repo.profiles.write() {
            profiles.insert(profile.id.clone(), profile);
        }
        repo
    }
}

impl ProfileRepository for InMemoryProfileRepository {
    fn save(&self, profile: &PlayerProfile) -> Result<()> {
        let mut profiles = self
            .profiles
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        profiles.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<PlayerProfile>> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(profiles.get(id).cloned())
    }

    fn exists(&self, id: &str) -> bool {
        self.profiles
            .read()
            .map(|profiles| profiles.contains_key(id))
            .unwrap_or(false)
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut profiles = self
            .profiles
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        profiles.remove(id);
        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let mut ids: Vec<String> = profiles.keys().cloned().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
