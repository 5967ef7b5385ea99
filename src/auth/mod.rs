//! Credential loading
//!
//! The login flow (run outside the TUI) writes ~/.config/fediboat/auth.json.
//! This module only reads it and hands a [`Credentials`] value to the API
//! client; the token is never parsed or stored anywhere else.

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::paths;

/// Credentials of the active user
#[derive(Clone)]
pub struct Credentials {
    /// Instance base URL, e.g. `https://mastodon.social`
    pub instance_url: String,
    /// Account id of the signed-in user
    pub account_id: String,
    /// Full handle, e.g. `user@mastodon.social`
    pub full_username: String,
    /// Bearer token
    pub access_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("instance_url", &self.instance_url)
            .field("account_id", &self.account_id)
            .field("full_username", &self.full_username)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct AuthFile {
    current: String,
    #[serde(default)]
    #[allow(dead_code)]
    apps: HashMap<String, AppEntry>,
    users: HashMap<String, UserEntry>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct AppEntry {
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct UserEntry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    instance: Option<String>,
    access_token: String,
}

/// Load credentials of the current user from the default location
pub fn load_credentials() -> Result<Credentials> {
    let path = paths::auth_path()?;
    load_credentials_from(&path)
}

/// Load credentials of the current user from a specific file
pub fn load_credentials_from(path: &Path) -> Result<Credentials> {
    if !path.is_file() {
        return Err(anyhow!(
            "{} does not exist!\nLog in first to create it.",
            path.display()
        ));
    }

    let raw = std::fs::read_to_string(path).context("Failed to read auth file")?;
    let file: AuthFile = serde_json::from_str(&raw).context("Failed to parse auth file")?;

    let user = file
        .users
        .get(&file.current)
        .ok_or_else(|| anyhow!("No credentials for current user {}", file.current))?;

    // Older files carry the instance only in the "user@domain" key
    let instance = match &user.instance {
        Some(instance) => instance.clone(),
        None => file
            .current
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_string())
            .ok_or_else(|| anyhow!("Cannot determine instance for {}", file.current))?,
    };

    let instance_url = if instance.starts_with("http") {
        instance.trim_end_matches('/').to_string()
    } else {
        format!("https://{instance}")
    };

    Ok(Credentials {
        instance_url,
        account_id: user.id.clone(),
        full_username: file.current.clone(),
        access_token: user.access_token.clone(),
    })
}
