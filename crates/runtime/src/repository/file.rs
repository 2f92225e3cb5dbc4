//! File-based ProfileRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use super::{PlayerProfile, ProfileRepository, RepositoryError, Result};

/// Stores each profile as `profile_{id}.json` under one directory.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash mid-save leaves the previous profile intact.
pub struct FileProfileRepository {
    base_dir: PathBuf,
}

impl FileProfileRepository {
    /// Create a new file-based profile repository.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn profile_path(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(RepositoryError::InvalidId(id.to_owned()));
        }
        Ok(self.base_dir.join(format!("profile_{id}.json")))
    }
}

impl ProfileRepository for FileProfileRepository {
    fn save(&self, profile: &PlayerProfile) -> Result<()> {
        let path = self.profile_path(&profile.id)?;
        let temp_path = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(profile)?;
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!(target: "nexus::persistence", "Saved profile[{}] to {}", profile.id, path.display());
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<PlayerProfile>> {
        let path = self.profile_path(id)?;
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path)?;
        let profile: PlayerProfile = serde_json::from_slice(&bytes)?;

        tracing::debug!(target: "nexus::persistence", "Loaded profile[{}] from {}", id, path.display());
        Ok(Some(profile))
    }

    fn exists(&self, id: &str) -> bool {
        self.profile_path(id).is_ok_and(|path| path.exists())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let path = self.profile_path(id)?;
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::debug!(target: "nexus::persistence", "Deleted profile[{}]", id);
        }
        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if let Some(id) = path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|name| name.strip_prefix("profile_"))
                .and_then(|rest| rest.strip_suffix(".json"))
            {
                ids.push(id.to_owned());
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}
