//! Dashboard configuration
//!
//! Loaded from `~/.bizdash/config.toml`, then overridden by environment
//! variables. Missing files and missing keys fall back to defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants;
use crate::error::ConfigError;
use crate::observer::ObserverOptions;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Backend base URL, including the `/api` prefix
    pub api_url: String,
    /// Bearer token sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    pub page_sizes: PageSizes,
    pub auto_load: AutoLoadConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: constants::http::DEFAULT_API_URL.to_string(),
            token: None,
            connect_timeout_secs: constants::http::CONNECT_TIMEOUT.as_secs(),
            request_timeout_secs: constants::http::REQUEST_TIMEOUT.as_secs(),
            page_sizes: PageSizes::default(),
            auto_load: AutoLoadConfig::default(),
        }
    }
}

/// Per-entity page sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSizes {
    pub clients: u32,
    pub products: u32,
    pub reports: u32,
    /// Used for search and filter results, which are not paged
    pub single_page: u32,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            clients: constants::pagination::DEFAULT_PAGE_SIZE,
            products: constants::pagination::DEFAULT_PAGE_SIZE,
            reports: constants::pagination::REPORT_PAGE_SIZE,
            single_page: constants::pagination::SINGLE_PAGE_SIZE,
        }
    }
}

/// Viewport-triggered loading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoLoadConfig {
    pub enabled: bool,
    pub threshold: f32,
    pub root_margin: u16,
    pub debounce_ms: u64,
}

impl Default for AutoLoadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: constants::observer::THRESHOLD,
            root_margin: constants::observer::ROOT_MARGIN,
            debounce_ms: constants::observer::DEBOUNCE.as_millis() as u64,
        }
    }
}

impl AutoLoadConfig {
    /// Observer options derived from this config
    pub fn observer_options(&self) -> ObserverOptions {
        ObserverOptions {
            threshold: self.threshold.clamp(0.0, 1.0),
            root_margin: self.root_margin,
            debounce: Duration::from_millis(self.debounce_ms),
        }
    }
}

impl DashboardConfig {
    /// Load from the default location and apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&crate::paths::config_file())?;
        config.apply_env();
        Ok(config)
    }

    /// Load from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let config: DashboardConfig = toml::from_str(&contents)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write to a specific file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `BIZDASH_API_URL` / `BIZDASH_TOKEN` overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(constants::env::API_URL).ok(),
            std::env::var(constants::env::TOKEN).ok(),
        );
    }

    /// Apply explicit overrides; empty values are ignored
    pub fn apply_overrides(&mut self, api_url: Option<String>, token: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token.trim().to_string());
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
