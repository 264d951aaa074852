// src/client.rs
//! Typed HTTP client for the SafeChatter API, used by the chat demo and tests.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::api::chain::{InvokeRequest, InvokeResponse};
use crate::api::deberta::{ProcessRequest, ProcessResponse, ResetResponse};
use crate::api::error::ErrorResponse;
use crate::conversation::ChatTurn;
use crate::scoring;
use crate::verdict::{ConversationInput, Verdict};

pub const ENV_API_BASE_URL: &str = "API_BASE_URL";
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8081";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("server returned HTTP {status} ({error}): {message}")]
    Api {
        status: u16,
        error: String,
        message: String,
        raw: Option<String>,
    },
    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl ClientError {
    /// The model answered, but not with a usable verdict.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            ClientError::Api { error, .. } if error == "parse_error" || error == "schema_violation"
        )
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            ClientError::Api { raw, .. } => raw.as_deref(),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("safechatter-client/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            // The verdict path waits on a local LLM.
            .timeout(Duration::from_secs(180))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// `API_BASE_URL`, or the local default.
    pub fn from_env() -> anyhow::Result<Self> {
        let base = std::env::var(ENV_API_BASE_URL)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        Self::new(base)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn process(
        &self,
        message: &str,
        role: &str,
        history: &[ChatTurn],
    ) -> Result<ProcessResponse, ClientError> {
        let body = ProcessRequest {
            message: message.to_string(),
            role: role.to_string(),
            history: history.to_vec(),
        };
        self.post("/deberta/process", &body).await
    }

    pub async fn reset(&self) -> Result<ResetResponse, ClientError> {
        self.post("/deberta/reset", &serde_json::json!({})).await
    }

    pub async fn invoke_verdict(&self, input: &ConversationInput) -> Result<Verdict, ClientError> {
        let body = InvokeRequest {
            input: input.clone(),
        };
        let resp: InvokeResponse = self.post("/api/mistral/invoke", &body).await?;
        Ok(resp.output)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| ClientError::Transport {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorResponse>(&text) {
                Ok(err) => ClientError::Api {
                    status: status.as_u16(),
                    error: err.error,
                    message: err.message,
                    raw: err.raw,
                },
                Err(_) => ClientError::Api {
                    status: status.as_u16(),
                    error: "http_error".to_string(),
                    message: text.chars().take(300).collect(),
                    raw: None,
                },
            });
        }

        serde_json::from_str(&text).map_err(|e| ClientError::Decode {
            url,
            reason: e.to_string(),
        })
    }
}

/// Flagged signals from a process response; recomputed from the scores when the
/// server did not send them.
pub fn signals(resp: &ProcessResponse, threshold: f64) -> Vec<String> {
    match &resp.flagged {
        Some(flagged) => flagged.clone(),
        None => scoring::flag_signals(&resp.scores, threshold),
    }
}
