// src/config/llm.rs
use serde::{Deserialize, Serialize};

use super::env_string;

pub const DEFAULT_LLM_MODEL: &str = "mistral-nemo:12b";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

pub const ENV_OLLAMA_BASE_URL: &str = "OLLAMA_BASE_URL";
pub const ENV_LLM_MODEL: &str = "LLM_MODEL";

/// Conversation-level verdict model served by Ollama.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// "ollama" | "mock" (case-insensitive)
    pub provider: String,
    pub base_url: String,
    pub model: String,
    /// Layers offloaded to GPU.
    pub num_gpu: u32,
    /// Context size in tokens.
    pub num_ctx: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            num_gpu: 99,
            num_ctx: 4096,
            timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    pub(crate) fn apply_env(&mut self) {
        if let Some(url) = env_string(ENV_OLLAMA_BASE_URL) {
            self.base_url = url;
        }
        if let Some(model) = env_string(ENV_LLM_MODEL) {
            self.model = model;
        }
        self.provider = self.provider.to_lowercase();
        if self.timeout_secs == 0 {
            self.timeout_secs = 120;
        }
    }
}
