//! Configuration loading for nutriscope.
//!
//! Configuration is loaded from TOML with the following resolution order:
//! 1. `--config <path>` (CLI flag); must exist
//! 2. `~/.nutriscope/config.toml` (user), if present
//! 3. built-in defaults
//!
//! `NUTRISCOPE_API_URL` overrides `api.base_url` after loading.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::session::AuthMode;
use crate::types::{FileConstraints, MediaKind};
use crate::{NutriscopeError, Result};

/// Environment variable overriding the service base URL.
pub const API_URL_ENV: &str = "NUTRISCOPE_API_URL";

/// Client configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub uploads: UploadLimits,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub features: FeatureFlags,
}

/// Prediction service connection.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Service base URL (default: http://localhost:8000).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Blanket request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Accepted upload formats and size ceiling.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadLimits {
    /// Largest accepted file (default: 10 MiB).
    #[serde(default = "default_max_size")]
    pub max_size_bytes: u64,
    #[serde(default = "default_image_types")]
    pub image_types: Vec<String>,
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    #[serde(default = "default_data_types")]
    pub data_types: Vec<String>,
    #[serde(default = "default_data_extensions")]
    pub data_extensions: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_size(),
            image_types: default_image_types(),
            image_extensions: default_image_extensions(),
            data_types: default_data_types(),
            data_extensions: default_data_extensions(),
        }
    }
}

impl UploadLimits {
    /// Constraints for one class of slot.
    pub fn constraints(&self, kind: MediaKind) -> FileConstraints {
        let (mime_types, extensions) = match kind {
            MediaKind::Image => (&self.image_types, &self.image_extensions),
            MediaKind::Data => (&self.data_types, &self.data_extensions),
        };
        FileConstraints {
            mime_types: mime_types.clone(),
            extensions: extensions.clone(),
            max_size_bytes: self.max_size_bytes,
        }
    }
}

fn default_max_size() -> u64 {
    10 * 1024 * 1024
}

fn default_image_types() -> Vec<String> {
    vec!["image/jpeg".into(), "image/png".into(), "image/jpg".into()]
}

fn default_image_extensions() -> Vec<String> {
    vec![".jpg".into(), ".jpeg".into(), ".png".into()]
}

fn default_data_types() -> Vec<String> {
    vec!["text/csv".into()]
}

fn default_data_extensions() -> Vec<String> {
    vec![".csv".into()]
}

/// Session persistence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Profile file (default: `<data dir>/nutriscope/session.json`).
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub auth_mode: AuthMode,
}

impl SessionConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_session_path)
    }
}

fn default_session_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".local/share"))
        .join("nutriscope")
        .join("session.json")
}

/// Notification defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Auto-dismiss delay in milliseconds; 0 keeps notifications until dismissed.
    #[serde(default = "default_notification_timeout")]
    pub timeout_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_notification_timeout(),
        }
    }
}

impl NotificationConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

fn default_notification_timeout() -> u64 {
    5000
}

/// Feature switches for the individual analyses.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    #[serde(default = "enabled")]
    pub meal_analysis: bool,
    #[serde(default = "enabled")]
    pub glucose_prediction: bool,
    #[serde(default = "enabled")]
    pub microbiome_analysis: bool,
    #[serde(default = "enabled")]
    pub meal_recommendations: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            meal_analysis: true,
            glucose_prediction: true,
            microbiome_analysis: true,
            meal_recommendations: true,
        }
    }
}

fn enabled() -> bool {
    true
}

impl Config {
    /// Load configuration from the standard locations, then apply env overrides.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };
        if let Ok(url) = std::env::var(API_URL_ENV)
            && !url.trim().is_empty()
        {
            config.api.base_url = url;
        }
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            NutriscopeError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            NutriscopeError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path. `Ok(None)` means "use defaults".
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(NutriscopeError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".nutriscope").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        Ok(None)
    }
}
