//! Configuration module for fediboat

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::NotificationKind;
use crate::paths;
use crate::theme::Theme;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Selected theme
    #[serde(default)]
    pub theme: Theme,

    /// Number of items to request per page
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,

    /// Rows from either end of the loaded items that trigger read-ahead
    #[serde(default = "default_prefetch_distance")]
    pub prefetch_distance: usize,

    /// Timelines kept in memory before the least recently used is evicted
    #[serde(default = "default_max_live_timelines")]
    pub max_live_timelines: usize,

    /// Automatic retries for transient fetch failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff between retries in milliseconds (doubles per attempt)
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    /// How often unsaved read flags are flushed to the cache
    #[serde(default = "default_read_flush_secs")]
    pub read_flush_secs: u64,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Notification display settings
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// Which notifications to fetch and how to mark them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Notification types requested from the server
    #[serde(default = "default_shown_notifications")]
    pub show: Vec<NotificationKind>,

    /// Glyph shown in the sign column per notification type.
    /// Merged over the built-in defaults.
    #[serde(default)]
    pub signs: HashMap<NotificationKind, String>,
}

fn default_page_limit() -> usize {
    40
}

fn default_prefetch_distance() -> usize {
    5
}

fn default_max_live_timelines() -> usize {
    16
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_ms() -> u64 {
    500
}

fn default_read_flush_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_shown_notifications() -> Vec<NotificationKind> {
    vec![
        NotificationKind::Favourite,
        NotificationKind::Mention,
        NotificationKind::Reblog,
        NotificationKind::Follow,
    ]
}

fn default_signs() -> HashMap<NotificationKind, String> {
    [
        (NotificationKind::Favourite, "★"),
        (NotificationKind::Mention, "@"),
        (NotificationKind::Reblog, "⮂"),
        (NotificationKind::Follow, "+"),
        (NotificationKind::FollowRequest, "r"),
        (NotificationKind::ModerationWarning, "w"),
    ]
    .into_iter()
    .map(|(kind, sign)| (kind, sign.to_string()))
    .collect()
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            show: default_shown_notifications(),
            signs: HashMap::new(),
        }
    }
}

impl NotificationsConfig {
    /// Sign for a notification type, user settings first
    pub fn sign(&self, kind: NotificationKind) -> Option<String> {
        self.signs
            .get(&kind)
            .cloned()
            .or_else(|| default_signs().remove(&kind))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            page_limit: default_page_limit(),
            prefetch_distance: default_prefetch_distance(),
            max_live_timelines: default_max_live_timelines(),
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
            read_flush_secs: default_read_flush_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            notifications: NotificationsConfig::default(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        paths::config_path()
    }

    /// Load config from the default path or create default
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// HTTP request timeout
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
