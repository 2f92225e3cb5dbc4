//! Client configuration structures and loaders.
use std::env;
use std::path::PathBuf;

use crate::dirs;

/// Configuration required to bootstrap the runtime for one play session.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Directory holding the exported content collections.
    pub content_dir: PathBuf,
    /// Optional TOML file with engine tunables.
    pub engine_config: Option<PathBuf>,
    pub profile_id: String,
    pub save_dir: PathBuf,
    pub tick_rate: u32,
    pub enable_persistence: bool,
    pub session_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("./content"),
            engine_config: None,
            profile_id: "default".to_owned(),
            save_dir: dirs::profile_dir(),
            tick_rate: 60,
            enable_persistence: false,
            session_id: None,
        }
    }
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `NEXUS_CONTENT_DIR` - Content export directory (default: ./content)
    /// - `NEXUS_ENGINE_CONFIG` - Engine tunables TOML file (optional)
    /// - `NEXUS_PROFILE_ID` - Player profile to restore and save (default: default)
    /// - `NEXUS_SAVE_DIR` - Directory for saved profiles (default: platform-specific)
    /// - `NEXUS_TICK_RATE` - Update loop frequency in Hz (default: 60)
    /// - `ENABLE_PERSISTENCE` - Save the profile as the world changes (default: false)
    /// - `NEXUS_SESSION_ID` - Session identifier for log files (default: auto-generated)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("NEXUS_CONTENT_DIR") {
            config.content_dir = PathBuf::from(dir);
        }
        config.engine_config = env::var("NEXUS_ENGINE_CONFIG").ok().map(PathBuf::from);

        if let Ok(id) = env::var("NEXUS_PROFILE_ID")
            && !id.trim().is_empty()
        {
            config.profile_id = id.trim().to_owned();
        }
        if let Ok(dir) = env::var("NEXUS_SAVE_DIR") {
            config.save_dir = PathBuf::from(dir);
        }
        if let Some(rate) = read_env::<u32>("NEXUS_TICK_RATE") {
            config.tick_rate = rate;
        }

        if let Some(enable) = read_env::<bool>("ENABLE_PERSISTENCE") {
            config.enable_persistence = enable;
        } else if env::var("ENABLE_PERSISTENCE").is_ok() {
            // Also accept just setting the variable without value as "true"
            config.enable_persistence = true;
        }

        config.session_id = env::var("NEXUS_SESSION_ID").ok();

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
