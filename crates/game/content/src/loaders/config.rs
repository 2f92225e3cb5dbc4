//! Engine configuration loader.

use std::path::Path;

use nexus_core::EngineConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for engine tunables from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load engine config from a TOML file.
    ///
    /// Keys missing from the file keep their defaults.
    pub fn load(path: &Path) -> LoadResult<EngineConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<EngineConfig> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ConfigLoader::parse("walk_speed = 2.0\nleaf_hold_ms = 500\n").unwrap();
        assert_eq!(config.walk_speed, 2.0);
        assert_eq!(config.leaf_hold_ms, 500);
        assert_eq!(config.typewriter_interval_ms, EngineConfig::default().typewriter_interval_ms);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(ConfigLoader::parse("walk_speed = [").is_err());
    }
}
