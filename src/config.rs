//! Project configuration.
//!
//! Read from `.scrolls/config.yaml` when present, then overridden from the
//! environment. The API key is normally supplied through the environment only.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::Realm;
use crate::error::{Result, ScrollError};
use crate::storage::StorageBackend;

pub const SCROLLS_DIR: &str = ".scrolls";
pub const CONFIG_FILE: &str = "config.yaml";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

/// Walk up from `start` looking for a `.scrolls/` directory.
pub fn find_scrolls_dir(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(SCROLLS_DIR);
        if candidate.is_dir() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollsConfig {
    pub storage: StorageBackend,
    pub default_realm: Realm,
    /// Seed the sample scroll the first time an empty project is opened.
    pub seed_sample: bool,
    pub spirit: SpiritConfig,
}

impl Default for ScrollsConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::default(),
            default_realm: Realm::default(),
            seed_sample: true,
            spirit: SpiritConfig::default(),
        }
    }
}

/// Settings for the Gemini-backed spirit.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiritConfig {
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
    /// Transport timeout; unset leaves the HTTP client default.
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for SpiritConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            base_url: DEFAULT_GEMINI_URL.to_string(),
            timeout_secs: None,
            api_key: None,
        }
    }
}

impl std::fmt::Debug for SpiritConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpiritConfig")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ScrollsConfig {
    /// Load `config.yaml` from the scrolls directory and apply env overrides.
    pub fn load(scrolls_dir: &Path) -> Result<Self> {
        let path = scrolls_dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            Self::from_yaml(&raw)?
        } else {
            Self::default()
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        debug!(?config, "Loaded config");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the file half of the config. The API key is never written.
    pub fn save(&self, scrolls_dir: &Path) -> Result<()> {
        let mut on_disk = self.clone();
        on_disk.spirit.api_key = None;
        fs::write(scrolls_dir.join(CONFIG_FILE), serde_yaml::to_string(&on_disk)?)?;
        Ok(())
    }

    /// Apply environment overrides through `lookup`. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GEMINI_API_KEY").or_else(|| get("API_KEY")) {
            self.spirit.api_key = Some(key);
        }
        if let Some(model) = get("SCROLLS_MODEL") {
            self.spirit.model = model;
        }
        if let Some(url) = get("SCROLLS_GEMINI_BASE_URL") {
            self.spirit.base_url = url;
        }
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.spirit.temperature) {
            return Err(ScrollError::Config(format!(
                "spirit.temperature must be within 0.0..=2.0, got {}",
                self.spirit.temperature
            )));
        }
        if self.spirit.model.trim().is_empty() {
            return Err(ScrollError::Config("spirit.model must not be empty".to_string()));
        }
        Ok(())
    }
}
