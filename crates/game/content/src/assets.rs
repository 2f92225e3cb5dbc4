//! Asset URL resolution.
//!
//! Media records store paths relative to the public storage root
//! (`clues/key.glb`). Absolute URLs and already-rooted paths pass through.

/// Maps a stored media path onto a URL the renderer can fetch.
pub trait AssetResolver: Send + Sync {
    fn resolve(&self, filepad: &str) -> String;
}

/// Resolves relative paths under a storage prefix, `/storage/` by default.
#[derive(Clone, Debug)]
pub struct StorageResolver {
    prefix: String,
}

impl StorageResolver {
    pub const DEFAULT_PREFIX: &'static str = "/storage/";

    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        Self { prefix }
    }
}

impl Default for StorageResolver {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}

impl AssetResolver for StorageResolver {
    fn resolve(&self, filepad: &str) -> String {
        let trimmed = filepad.trim();
        if trimmed.starts_with("http://")
            || trimmed.starts_with("https://")
            || trimmed.starts_with(&self.prefix)
        {
            return trimmed.to_owned();
        }
        format!("{}{}", self.prefix, trimmed.trim_start_matches('/'))
    }
}
