// src/config/mod.rs
//! Layered configuration: built-in defaults, then `config/safechatter.toml`
//! (or `$SAFECHATTER_CONFIG`), then individual env overrides.

pub mod classifier;
pub mod llm;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub use classifier::ClassifierConfig;
pub use llm::LlmConfig;

// --- env defaults & names ---
pub const DEFAULT_CONFIG_PATH: &str = "config/safechatter.toml";
pub const ENV_CONFIG_PATH: &str = "SAFECHATTER_CONFIG";
pub const ENV_TEST_MODE: &str = "AI_TEST_MODE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub classifier: ClassifierConfig,
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Resolve the config path, read it if present, apply env overrides and validate.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let mut cfg = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                anyhow::anyhow!("Failed to read config at {}: {}", path.display(), e)
            })?;
            Self::from_toml_str(&content)
                .map_err(|e| anyhow::anyhow!("Invalid config at {}: {}", path.display(), e))?
        } else {
            info!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        cfg.apply_env();
        cfg.classifier.resolve_api_key()?;
        cfg.classifier.validate()?;
        cfg.classifier.sanitize();
        Ok(cfg)
    }

    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Individual env overrides; unparseable values are ignored.
    pub fn apply_env(&mut self) {
        self.classifier.apply_env();
        self.llm.apply_env();

        if test_mode_enabled() {
            self.classifier.provider = "mock".to_string();
            self.llm.provider = "mock".to_string();
        }
    }
}

/// `AI_TEST_MODE=mock` swaps both model collaborators for in-process mocks.
pub fn test_mode_enabled() -> bool {
    std::env::var(ENV_TEST_MODE)
        .map(|v| v == "mock")
        .unwrap_or(false)
}

pub(crate) fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok())
}

pub(crate) fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
