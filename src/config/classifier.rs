// src/config/classifier.rs
use serde::{Deserialize, Serialize};
use std::env;

use super::{env_parse, env_string};
use crate::conversation::DEFAULT_CONTEXT_WINDOW;
use crate::labels::{self, validate_candidates};
use crate::scoring::DEFAULT_FLAG_THRESHOLD;

pub const DEFAULT_CLASSIFIER_MODEL: &str = "MoritzLaurer/deberta-v3-large-zeroshot-v2.0";
const HF_INFERENCE_BASE: &str = "https://api-inference.huggingface.co/models";

pub const ENV_THRESHOLD: &str = "CLASSIFIER_THRESHOLD";
pub const ENV_CONTEXT_WINDOW: &str = "CLASSIFIER_CONTEXT_WINDOW";
pub const ENV_ENDPOINT: &str = "CLASSIFIER_ENDPOINT";
pub const ENV_HF_TOKEN: &str = "HF_API_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// "huggingface" | "mock" (case-insensitive)
    pub provider: String,
    /// Full URL of the zero-shot endpoint; derived from `model` when absent.
    pub endpoint: Option<String>,
    pub model: String,
    /// Empty means no auth; "ENV" means: read from HF_API_TOKEN.
    pub api_key: String,
    /// Flag a category when its score is strictly above this.
    pub threshold: f64,
    pub use_context: bool,
    pub context_window: usize,
    pub timeout_secs: u64,
    /// Candidate phrases; must match the fine label set exactly.
    pub candidate_labels: Option<Vec<String>>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: "huggingface".to_string(),
            endpoint: None,
            model: DEFAULT_CLASSIFIER_MODEL.to_string(),
            api_key: String::new(),
            threshold: DEFAULT_FLAG_THRESHOLD,
            use_context: true,
            context_window: DEFAULT_CONTEXT_WINDOW,
            timeout_secs: 30,
            candidate_labels: None,
        }
    }
}

impl ClassifierConfig {
    pub fn endpoint_url(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("{HF_INFERENCE_BASE}/{}", self.model))
    }

    pub fn candidates(&self) -> Vec<String> {
        self.candidate_labels
            .clone()
            .unwrap_or_else(labels::candidate_labels)
    }

    pub(crate) fn apply_env(&mut self) {
        if let Some(t) = env_parse::<f64>(ENV_THRESHOLD) {
            self.threshold = t.clamp(0.0, 1.0);
        }
        if let Some(w) = env_parse::<usize>(ENV_CONTEXT_WINDOW) {
            self.context_window = w;
        }
        if let Some(url) = env_string(ENV_ENDPOINT) {
            self.endpoint = Some(url);
        }
        self.provider = self.provider.to_lowercase();
    }

    pub(crate) fn resolve_api_key(&mut self) -> anyhow::Result<()> {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = match self.provider.as_str() {
                "huggingface" => env::var(ENV_HF_TOKEN)
                    .map_err(|_| anyhow::anyhow!("Missing {ENV_HF_TOKEN} env var"))?,
                _ => String::new(),
            };
        }
        Ok(())
    }

    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        match self.provider.as_str() {
            "huggingface" | "mock" => {}
            other => anyhow::bail!("Unsupported classifier provider in config: {other}"),
        }
        validate_candidates(&self.candidates())?;
        Ok(())
    }

    pub(crate) fn sanitize(&mut self) {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            self.threshold = DEFAULT_FLAG_THRESHOLD;
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = 30;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_defaults_to_hosted_model() {
        let cfg = ClassifierConfig::default();
        assert_eq!(
            cfg.endpoint_url(),
            "https://api-inference.huggingface.co/models/MoritzLaurer/deberta-v3-large-zeroshot-v2.0"
        );
    }

    #[test]
    fn out_of_range_threshold_falls_back() {
        let mut cfg = ClassifierConfig {
            threshold: 1.7,
            ..Default::default()
        };
        cfg.sanitize();
        assert!((cfg.threshold - DEFAULT_FLAG_THRESHOLD).abs() < f64::EPSILON);
    }

    #[test]
    fn bad_candidate_list_fails_validation() {
        let cfg = ClassifierConfig {
            candidate_labels: Some(vec!["Benign".into()]),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_provider_fails_validation() {
        let cfg = ClassifierConfig {
            provider: "openai".into(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
