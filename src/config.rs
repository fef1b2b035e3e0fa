//! Client configuration handling

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::thread::DEFAULT_PAGE_SIZE;

/// China Standard Time, the tracker's display zone.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 480;
pub const DEFAULT_WRAP_WIDTH: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, for example `http://tracker.local/api`.
    pub api_base: Option<String>,
    pub token: Option<String>,
    /// Local SQLite store, used when no API base is set.
    pub db_path: Option<PathBuf>,
    pub reply_page_size: usize,
    pub utc_offset_minutes: i32,
    pub wrap_width: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: None,
            token: None,
            db_path: None,
            reply_page_size: DEFAULT_PAGE_SIZE,
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            wrap_width: DEFAULT_WRAP_WIDTH,
        }
    }
}

impl ClientConfig {
    /// Apply `WT_API_BASE`, `WT_TOKEN` and `WT_DB` from `lookup`.
    #[must_use]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(base) = non_blank("WT_API_BASE") {
            self.api_base = Some(base);
        }
        if let Some(token) = non_blank("WT_TOKEN") {
            self.token = Some(token);
        }
        if let Some(db) = non_blank("WT_DB") {
            self.db_path = Some(PathBuf::from(db));
        }
        self
    }
}

/// Load client configuration from the user's config directory.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed.
pub fn load_client_config() -> anyhow::Result<Option<ClientConfig>> {
    match config_path() {
        Some(path) => load_client_config_from(&path),
        None => Ok(None),
    }
}

/// Load client configuration from `path`, if it exists.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_client_config_from(path: &Path) -> anyhow::Result<Option<ClientConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(Some(config))
}

/// Apply `edit` to the stored configuration and write it back.
///
/// Environment overrides are not read, so they never end up in the file.
///
/// # Errors
///
/// Returns an error if no config directory is known, or the file cannot be
/// read, parsed or written.
pub fn save_client_config(edit: impl FnOnce(&mut ClientConfig)) -> anyhow::Result<PathBuf> {
    let path = config_path().context("No config directory (set XDG_CONFIG_HOME or HOME)")?;
    save_client_config_at(&path, edit)?;
    Ok(path)
}

/// # Errors
///
/// Returns an error if the file cannot be read, parsed or written.
pub fn save_client_config_at(
    path: &Path,
    edit: impl FnOnce(&mut ClientConfig),
) -> anyhow::Result<ClientConfig> {
    let mut config = load_client_config_from(path)?.unwrap_or_default();
    edit(&mut config);
    save_client_config_to(&config, path)?;
    Ok(config)
}

/// # Errors
///
/// Returns an error if the parent directory cannot be created or the file cannot be written.
pub fn save_client_config_to(config: &ClientConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let contents = serde_json::to_string_pretty(config)?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    Ok(())
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg)
    } else if let Ok(home) = std::env::var("HOME") {
        Path::new(&home).join(".config")
    } else {
        return None;
    };

    Some(base.join(".worktrack").join("client.json"))
}
