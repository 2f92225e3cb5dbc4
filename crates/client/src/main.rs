//! Nexus adventure client binary.
//!
//! This binary is the composition root that assembles:
//! 1. Configuration from the environment (and `.env`)
//! 2. Logging to a per-session log file
//! 3. Content loaded from an exported content directory
//! 4. The runtime, with optional profile persistence
//! 5. A headless script that plays actions and dialogues, printing every
//!    runtime event as a JSON line
//!
//! # Examples
//!
//! ```bash
//! NEXUS_CONTENT_DIR=./content cargo run -p nexus-client -- action:3 dialogue:hank_intro
//! ```

mod config;
mod dirs;
mod logging;
mod script;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use nexus_content::{ConfigLoader, ContentLoader};
use nexus_core::EngineConfig;
use nexus_runtime::{FileProfileRepository, ProfileRepository, Runtime, RuntimeConfig};

use crate::config::ClientConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // 1. Load configuration from environment
    let config = ClientConfig::from_env();
    let commands = script::parse_args(std::env::args().skip(1))?;

    // 2. Setup logging
    let _log_guard = logging::setup_logging(&config.session_id)?;

    tracing::info!("Starting Nexus client");
    tracing::info!("Content: {}", config.content_dir.display());
    tracing::info!("Persistence: {}", config.enable_persistence);

    // 3. Load engine tunables and content
    let engine = match &config.engine_config {
        Some(path) => ConfigLoader::load(path)
            .with_context(|| format!("loading engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let (content, report) = ContentLoader::new(&config.content_dir).load();
    for failure in &report.failures {
        tracing::warn!("{}", failure);
    }
    if !report.diagnostics.is_empty() {
        tracing::warn!("{} content warnings repaired at load", report.diagnostics.len());
    }
    if content.scenes.is_empty() {
        tracing::warn!("No scenes in {}; the stage stays empty", config.content_dir.display());
    }

    // 4. Build runtime
    tracing::debug!("Building runtime...");
    let runtime_config = RuntimeConfig {
        engine,
        tick_rate: config.tick_rate,
        enable_persistence: config.enable_persistence,
        profile_id: config.profile_id.clone(),
        ..RuntimeConfig::default()
    };
    let mut builder = Runtime::builder().config(runtime_config).content(content);
    if config.enable_persistence {
        let repository = FileProfileRepository::new(&config.save_dir)
            .with_context(|| format!("opening save directory {}", config.save_dir.display()))?;
        tracing::info!("Profiles: {}", repository.base_dir().display());
        let repository: Arc<dyn ProfileRepository> = Arc::new(repository);
        builder = builder.repository(repository);
    }
    let runtime = builder.build().await?;
    tracing::info!("Runtime built successfully");

    // 5. Play the script
    let handle = runtime.handle();
    let printers = script::spawn_event_printer(&handle);

    let world = handle.world();
    tracing::info!(
        scene = ?world.current_scene_id,
        clues = world.inventory.len(),
        "session ready"
    );

    let result = script::run(&handle, &commands).await;
    if let Err(e) = &result {
        tracing::error!("Script failed: {:#}", e);
    }

    // Let the printers catch up before the bus closes.
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(handle);
    runtime.shutdown().await?;
    for printer in printers {
        printer.abort();
    }

    tracing::info!("Client shutdown complete");
    result
}
