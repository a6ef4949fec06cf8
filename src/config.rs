//! Gateway configuration management.
//!
//! This module handles loading and saving the gateway configuration:
//! cache version, origin, pre-cache manifest, classification lists,
//! partition size limits, and notification defaults.
//!
//! Configuration is stored at `~/.config/counselcache/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "counselcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default cache version. Bumping this invalidates every old partition
/// on the next activation.
const DEFAULT_VERSION: &str = "counselcache-v1.0.0";

/// Default maximum entry count for the dynamic partition
const DEFAULT_MAX_DYNAMIC_ENTRIES: usize = 50;

/// Default maximum entry count for the image partition
const DEFAULT_MAX_IMAGE_ENTRIES: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Version-qualified base name for cache partitions
    pub version: String,
    /// Origin the dashboard is served from; requests to other origins
    /// (loopback excepted) are passed through untouched
    pub origin: String,
    /// App-shell paths pre-cached into the static partition at install
    pub precache_manifest: Vec<String>,
    /// Pages expected to land in the dynamic partition. Informational only;
    /// classification does not consult this list.
    pub dynamic_routes: Vec<String>,
    /// Path prefixes classified as API calls
    pub api_prefixes: Vec<String>,
    pub max_dynamic_entries: usize,
    pub max_image_entries: usize,
    /// Endpoint queued student-record mutations are replayed to
    pub sync_endpoint: String,
    pub notification: NotificationDefaults,
}

/// Fallback notification content when a push message carries no payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: "Counselling Dashboard".to_string(),
            body: "New student alert available".to_string(),
            icon: "/icon-192.png".to_string(),
            badge: "/badge-72.png".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            origin: "http://localhost:5173".to_string(),
            precache_manifest: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
            ],
            dynamic_routes: vec![
                "/dashboard".to_string(),
                "/students".to_string(),
                "/settings".to_string(),
                "/risk-overview".to_string(),
            ],
            api_prefixes: vec!["/api/".to_string(), "/gs_api/".to_string()],
            max_dynamic_entries: DEFAULT_MAX_DYNAMIC_ENTRIES,
            max_image_entries: DEFAULT_MAX_IMAGE_ENTRIES,
            sync_endpoint: "/api/students/sync".to_string(),
            notification: NotificationDefaults::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
