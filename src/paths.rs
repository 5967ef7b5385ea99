//! Common paths for fediboat data storage
//!
//! All fediboat data is stored under ~/.config/fediboat/ on all platforms:
//! - config.toml - User configuration
//! - auth.json - Credentials written by the login flow
//! - cache.sqlite - Timeline cache
//! - fediboat.log - Log output while the TUI is running

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Get the fediboat data directory (~/.config/fediboat/)
pub fn fediboat_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let dir = home.join(".config").join("fediboat");
    fs::create_dir_all(&dir).context("Failed to create fediboat directory")?;
    Ok(dir)
}

/// Get the config file path (~/.config/fediboat/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(fediboat_dir()?.join("config.toml"))
}

/// Get the credentials file path (~/.config/fediboat/auth.json)
pub fn auth_path() -> Result<PathBuf> {
    Ok(fediboat_dir()?.join("auth.json"))
}

/// Get the timeline cache path (~/.config/fediboat/cache.sqlite)
pub fn cache_path() -> Result<PathBuf> {
    Ok(fediboat_dir()?.join("cache.sqlite"))
}

/// Get the log file path (~/.config/fediboat/fediboat.log)
pub fn log_path() -> Result<PathBuf> {
    Ok(fediboat_dir()?.join("fediboat.log"))
}
