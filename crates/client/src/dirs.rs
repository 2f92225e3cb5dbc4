//! Platform-specific directory utilities
//!
//! Provides consistent directory paths across different operating systems,
//! following platform conventions for cache and data directories.

use std::path::PathBuf;

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "nexus")
}

/// Get the platform-specific log directory
///
/// - macOS: `~/Library/Caches/nexus/logs`
/// - Linux: `~/.cache/nexus/logs` (or `$XDG_CACHE_HOME/nexus/logs`)
/// - Windows: `%LOCALAPPDATA%\nexus\logs`
/// - Fallback: `/tmp/nexus/logs`
pub fn log_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/nexus"))
        .join("logs")
}

/// Get the platform-specific directory for saved profiles
///
/// - macOS: `~/Library/Application Support/nexus/profiles`
/// - Linux: `~/.local/share/nexus/profiles` (or `$XDG_DATA_HOME/nexus/profiles`)
/// - Windows: `%APPDATA%\nexus\profiles`
/// - Fallback: `./save_data/profiles`
pub fn profile_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./save_data"))
        .join("profiles")
}
