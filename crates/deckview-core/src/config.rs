#![forbid(unsafe_code)]

//! Deployment configuration for the bootstrap.
//!
//! One [`BootConfig`] replaces the per-deployment copies of the startup
//! script: data shape, base URL, service-worker policy, scroll animation and
//! the DOM/Elm names all come from here.
//!
//! ```json
//! {
//!   "data_shape": "deck_structured",
//!   "base_url": "https://cards.example.org/",
//!   "enable_service_worker": true,
//!   "mount_selector": "#app div"
//! }
//! ```
//!
//! Missing fields take the defaults below, so `{}` is a valid config.

use serde::{Deserialize, Serialize};

use crate::CARD_ID_PARAM;

pub const DEFAULT_MOUNT_SELECTOR: &str = "#root";
pub const DEFAULT_SERVICE_WORKER_URL: &str = "/service-worker.js";
pub const DEFAULT_ELM_MODULE: &str = "Main";
pub const DEFAULT_SCROLL_PORT: &str = "scrollToElementById";
pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Shape of the flags handed to the UI application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataShape {
    /// A bare array of cards.
    #[default]
    Flat,
    /// `{ "decks": ..., "baseUrl": ... }`.
    #[serde(alias = "deck-structured", alias = "decks")]
    DeckStructured,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootConfig {
    pub data_shape: DataShape,
    /// Base URL forwarded untouched in deck-structured flags.
    pub base_url: Option<String>,
    /// `true` registers the offline-cache worker, `false` unregisters any
    /// previously installed one.
    pub enable_service_worker: bool,
    pub service_worker_url: String,
    pub smooth_scroll: bool,
    /// Only scroll to elements inside the mount container.
    pub scope_to_mount: bool,
    /// CSS selector of the UI mount container.
    pub mount_selector: String,
    pub deep_link_param: String,
    /// Module path under `globalThis.Elm`, dot-separated (`Main`, `Deck.Main`).
    pub elm_module: String,
    pub scroll_port: String,
    pub log_level: String,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            data_shape: DataShape::Flat,
            base_url: None,
            enable_service_worker: false,
            service_worker_url: DEFAULT_SERVICE_WORKER_URL.to_owned(),
            smooth_scroll: true,
            scope_to_mount: false,
            mount_selector: DEFAULT_MOUNT_SELECTOR.to_owned(),
            deep_link_param: CARD_ID_PARAM.to_owned(),
            elm_module: DEFAULT_ELM_MODULE.to_owned(),
            scroll_port: DEFAULT_SCROLL_PORT.to_owned(),
            log_level: DEFAULT_LOG_LEVEL.to_owned(),
        }
    }
}

impl BootConfig {
    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Validate all fields.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, value) in [
            ("mount_selector", &self.mount_selector),
            ("deep_link_param", &self.deep_link_param),
            ("elm_module", &self.elm_module),
            ("scroll_port", &self.scroll_port),
            ("service_worker_url", &self.service_worker_url),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("{name} must not be empty"));
            }
        }

        if self.elm_module.split('.').any(str::is_empty) && !self.elm_module.is_empty() {
            errors.push(format!(
                "elm_module must be a dot-separated module path, got {:?}",
                self.elm_module
            ));
        }

        if self.data_shape == DataShape::DeckStructured && self.base_url.is_none() {
            errors.push("base_url is required when data_shape is deck_structured".into());
        }

        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            errors.push(format!(
                "log_level must be one of {LOG_LEVELS:?}, got {:?}",
                self.log_level
            ));
        }

        errors
    }

    /// Elm module path split into segments.
    pub fn elm_module_path(&self) -> impl Iterator<Item = &str> {
        self.elm_module.split('.')
    }

    /// Serialize to a single JSONL line for startup logs.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_owned())
    }
}

/// Configuration loading error.
#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(e) => write!(f, "boot config JSON error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
        }
    }
}
