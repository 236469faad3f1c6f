use serde::Deserialize;
use std::path::Path;

use crate::settings::{BackendMode, Theme};
use crate::store::DEFAULT_API_BASE_URL;

/// Environment variable that overrides `api.base_url`.
pub const API_URL_ENV: &str = "WILDGUARD_API_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (0 = no timeout).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.into()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_start_view")]
    pub start_view: String,
    #[serde(default = "default_live")]
    pub live: bool,
}

fn default_start_view() -> String {
    "dashboard".into()
}
fn default_live() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            start_view: default_start_view(),
            live: default_live(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub mode: BackendMode,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback chain: explicit path → ./config/default.toml → hardcoded defaults.
    /// Environment overrides are applied last.
    pub fn load_or_default(explicit_path: Option<&Path>) -> Self {
        let mut config = Self::load_file_or_default(explicit_path);
        config.apply_env_overrides(std::env::var(API_URL_ENV).ok().as_deref());
        config
    }

    fn load_file_or_default(explicit_path: Option<&Path>) -> Self {
        if let Some(path) = explicit_path {
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {e}", path.display());
                }
            }
        }

        let default_path = Path::new("config/default.toml");
        if default_path.exists() {
            match Self::load(default_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!("Failed to load default config: {e}");
                }
            }
        }

        tracing::info!("Using hardcoded default configuration");
        Self::default()
    }

    /// Apply a `WILDGUARD_API_URL` value; blank values are ignored.
    pub fn apply_env_overrides(&mut self, api_url: Option<&str>) {
        if let Some(url) = api_url.map(str::trim).filter(|u| !u.is_empty()) {
            tracing::debug!("api base url overridden from {API_URL_ENV}");
            self.api.base_url = url.to_string();
        }
    }
}
