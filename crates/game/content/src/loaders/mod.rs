//! Content loaders for reading authored data from files.
//!
//! The content repository exports one JSON file per collection. Engine
//! tunables live in a separate TOML file.

pub mod config;
pub mod content;

pub use config::ConfigLoader;
pub use content::{Collection, ContentLoader, LoadFailure, LoadReport};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}

/// Reads and parses a JSON file.
pub(crate) fn read_json(path: &Path) -> LoadResult<serde_json::Value> {
    let content = read_file(path)?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse JSON {}: {}", path.display(), e))
}
