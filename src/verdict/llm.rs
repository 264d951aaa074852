// src/verdict/llm.rs
//! LLM backend seam: Ollama `/api/generate` and a scripted mock.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LlmConfig;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Transport(String),
    #[error("LLM returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("LLM response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Complete `prompt` and return the raw reply text.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
    fn model_name(&self) -> &str;
}

pub type SharedLlm = Arc<dyn LlmBackend>;

pub fn build_llm_from_config(config: &LlmConfig) -> anyhow::Result<SharedLlm> {
    match config.provider.as_str() {
        "mock" => Ok(Arc::new(MockLlm::keywords())),
        "ollama" => Ok(Arc::new(OllamaBackend::new(config)?)),
        other => anyhow::bail!("Unsupported LLM provider: {other}"),
    }
}

// ------------------------------------------------------------
// Ollama
// ------------------------------------------------------------

pub struct OllamaBackend {
    http: reqwest::Client,
    url: String,
    model: String,
    options: OllamaOptions,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct OllamaOptions {
    num_gpu: u32,
    num_ctx: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaBackend {
    pub fn new(config: &LlmConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("safechatter/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url: format!("{}/api/generate", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            options: OllamaOptions {
                num_gpu: config.num_gpu,
                num_ctx: config.num_ctx,
            },
        })
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let req = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: self.options,
        };

        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: body.chars().take(300).collect(),
            });
        }

        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;
        Ok(body.response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ------------------------------------------------------------
// Mock
// ------------------------------------------------------------

enum Script {
    Keywords,
    Fixed(String),
    Fail(String),
}

/// Scripted backend for tests and `AI_TEST_MODE=mock`. Prompts are kept only after
/// [`MockLlm::recording`].
pub struct MockLlm {
    script: Script,
    prompts: Option<Mutex<Vec<String>>>,
}

const TACTIC_KEYWORDS: &[(&str, &str)] = &[
    ("wrong number", "wrong_number_intro"),
    ("is that you", "wrong_number_intro"),
    ("where are you from", "personal_information_seeking"),
    ("beautiful", "flattery_or_romance"),
    ("invest", "financial_gain_opportunity"),
    ("crypto", "financial_gain_opportunity"),
    ("fee", "fee_pressure"),
    ("whatsapp", "channel_shifting_proposal"),
    ("telegram", "channel_shifting_proposal"),
];

impl MockLlm {
    /// Answers SCAM when the conversation mentions two or more tactics (or one tactic
    /// with a frequency above 100), BENIGN otherwise.
    pub fn keywords() -> Self {
        Self::with(Script::Keywords)
    }

    /// Always replies with `reply`, verbatim.
    pub fn fixed(reply: impl Into<String>) -> Self {
        Self::with(Script::Fixed(reply.into()))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::with(Script::Fail(message.into()))
    }

    fn with(script: Script) -> Self {
        Self {
            script,
            prompts: None,
        }
    }

    /// Keep every prompt so tests can inspect what was sent.
    pub fn recording(mut self) -> Self {
        self.prompts = Some(Mutex::new(Vec::new()));
        self
    }

    /// Prompts sent so far, oldest first. Always empty unless recording.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .as_ref()
            .map(|p| p.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .unwrap_or_default()
    }

    fn keyword_reply(prompt: &str) -> String {
        let lower = prompt.to_lowercase();
        let frequency = lower
            .split("starter message frequency:")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|n| n.parse::<i64>().ok())
            .unwrap_or(0);
        let conversation = lower
            .split("**conversation:**")
            .nth(1)
            .unwrap_or_default();

        let mut tactics: Vec<&str> = Vec::new();
        for &(needle, tactic) in TACTIC_KEYWORDS {
            if conversation.contains(needle) && !tactics.contains(&tactic) {
                tactics.push(tactic);
            }
        }

        let scam = tactics.len() >= 2 || (!tactics.is_empty() && frequency > 100);
        let (label, confidence) = if scam {
            ("SCAM", (0.6 + 0.1 * tactics.len() as f64).min(0.95))
        } else {
            tactics.clear();
            ("BENIGN", 0.8)
        };
        serde_json::json!({
            "label": label,
            "confidence": confidence,
            "tactics": tactics,
        })
        .to_string()
    }
}

#[async_trait]
impl LlmBackend for MockLlm {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        if let Some(prompts) = &self.prompts {
            prompts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(prompt.to_string());
        }
        match &self.script {
            Script::Keywords => Ok(Self::keyword_reply(prompt)),
            Script::Fixed(reply) => Ok(reply.clone()),
            Script::Fail(msg) => Err(LlmError::Transport(msg.clone())),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
