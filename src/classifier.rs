//! Zero-shot classifier collaborator: trait seam, Hugging Face style inference
//! endpoint, and a deterministic mock.
//!
//! The model handle is built once at startup and shared read-only (`Arc<dyn _>`)
//! across requests; no conversation state lives here.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ClassifierConfig;
use crate::labels::FineLabel;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Transport(String),
    #[error("classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("classifier response could not be decoded: {0}")]
    Decode(String),
    #[error("classifier response is malformed: {0}")]
    Shape(String),
}

/// Parallel label/score arrays as returned by a zero-shot pipeline. Order is not
/// meaningful; callers re-sort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroShotOutput {
    pub labels: Vec<String>,
    pub scores: Vec<f64>,
}

impl ZeroShotOutput {
    pub fn pairs(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.scores.iter().copied())
    }

    /// Parallel arrays of equal length, every score a probability.
    pub fn validate(self) -> Result<Self, ClassifierError> {
        if self.labels.len() != self.scores.len() {
            return Err(ClassifierError::Shape(format!(
                "{} labels but {} scores",
                self.labels.len(),
                self.scores.len()
            )));
        }
        if let Some((label, score)) = self
            .pairs()
            .find(|(_, s)| !s.is_finite() || !(0.0..=1.0).contains(s))
        {
            return Err(ClassifierError::Shape(format!(
                "score {score} for `{label}` is outside [0, 1]"
            )));
        }
        Ok(self)
    }
}

#[async_trait]
pub trait ZeroShotClassifier: Send + Sync {
    /// Score `text` against every candidate label.
    async fn classify(
        &self,
        text: &str,
        candidate_labels: &[String],
        multi_label: bool,
    ) -> Result<ZeroShotOutput, ClassifierError>;

    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type SharedClassifier = Arc<dyn ZeroShotClassifier>;

/// Factory: build the classifier named by `config.provider`.
pub fn build_classifier_from_config(config: &ClassifierConfig) -> anyhow::Result<SharedClassifier> {
    match config.provider.as_str() {
        "mock" => Ok(Arc::new(MockClassifier::keywords())),
        "huggingface" => Ok(Arc::new(HfZeroShotClassifier::new(config)?)),
        other => anyhow::bail!("Unsupported classifier provider: {other}"),
    }
}

// ------------------------------------------------------------
// Hugging Face inference endpoint
// ------------------------------------------------------------

/// Calls a zero-shot-classification endpoint speaking the Hugging Face inference
/// protocol (`inputs` + `parameters.candidate_labels`).
pub struct HfZeroShotClassifier {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct HfRequest<'a> {
    inputs: &'a str,
    parameters: HfParameters<'a>,
}

#[derive(Serialize)]
struct HfParameters<'a> {
    candidate_labels: &'a [String],
    multi_label: bool,
}

#[derive(Deserialize)]
struct HfLabelScore {
    label: String,
    score: f64,
}

/// The hosted API answers either with parallel arrays (optionally wrapped in a
/// one-element list) or with a list of label/score objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum HfResponse {
    Parallel(ZeroShotOutput),
    Wrapped(Vec<ZeroShotOutput>),
    Pairs(Vec<HfLabelScore>),
}

impl HfResponse {
    fn into_output(self) -> Result<ZeroShotOutput, ClassifierError> {
        match self {
            HfResponse::Parallel(out) => Ok(out),
            HfResponse::Wrapped(mut v) => {
                if v.len() != 1 {
                    return Err(ClassifierError::Shape(format!(
                        "expected one result, got {}",
                        v.len()
                    )));
                }
                Ok(v.remove(0))
            }
            HfResponse::Pairs(pairs) => {
                let (labels, scores) = pairs.into_iter().map(|p| (p.label, p.score)).unzip();
                Ok(ZeroShotOutput { labels, scores })
            }
        }
    }
}

impl HfZeroShotClassifier {
    pub fn new(config: &ClassifierConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("safechatter/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint_url(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ZeroShotClassifier for HfZeroShotClassifier {
    async fn classify(
        &self,
        text: &str,
        candidate_labels: &[String],
        multi_label: bool,
    ) -> Result<ZeroShotOutput, ClassifierError> {
        let body = HfRequest {
            inputs: text,
            parameters: HfParameters {
                candidate_labels,
                multi_label,
            },
        };

        let mut req = self.http.post(&self.endpoint).json(&body);
        if !self.api_key.is_empty() {
            req = req.bearer_auth(&self.api_key);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body: truncate(&body, 300),
            });
        }

        let parsed: HfResponse = resp
            .json()
            .await
            .map_err(|e| ClassifierError::Decode(e.to_string()))?;
        parsed.into_output()?.validate()
    }

    fn provider_name(&self) -> &'static str {
        "huggingface"
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

// ------------------------------------------------------------
// Mock
// ------------------------------------------------------------

enum MockBehavior {
    Keywords,
    Fixed(Vec<(String, f64)>),
    Fail(String),
}

/// Deterministic in-process classifier for tests and `AI_TEST_MODE=mock`.
/// Input texts are kept only after [`MockClassifier::recording`]; the server-side
/// mock holds no chat text.
pub struct MockClassifier {
    behavior: MockBehavior,
    seen: Option<Mutex<Vec<String>>>,
}

const KEYWORDS: &[(&str, FineLabel, f64)] = &[
    ("wrong number", FineLabel::WrongNumber, 0.93),
    ("sorry", FineLabel::AccidentalApology, 0.71),
    ("beautiful", FineLabel::Complimenting, 0.77),
    ("handsome", FineLabel::FriendlyFlattery, 0.74),
    ("where are you from", FineLabel::PersonalInfoSeeking, 0.74),
    ("crypto", FineLabel::InvestmentMention, 0.82),
    ("invest", FineLabel::InvestmentOffering, 0.88),
    ("whatsapp", FineLabel::SwitchToWhatsApp, 0.95),
    ("telegram", FineLabel::MoveToTelegram, 0.94),
    ("fee", FineLabel::VerificationFee, 0.86),
    ("hurry", FineLabel::ScarcityPressure, 0.8),
];

impl MockClassifier {
    /// Scores phrases by keyword hits; texts with no hit lean benign.
    pub fn keywords() -> Self {
        Self::with(MockBehavior::Keywords)
    }

    /// Always returns the given pairs, whatever the input.
    pub fn fixed<S: Into<String>>(pairs: impl IntoIterator<Item = (S, f64)>) -> Self {
        Self::with(MockBehavior::Fixed(
            pairs.into_iter().map(|(l, s)| (l.into(), s)).collect(),
        ))
    }

    /// Every call fails with a transport error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with(MockBehavior::Fail(message.into()))
    }

    fn with(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            seen: None,
        }
    }

    /// Keep every submitted text so tests can inspect what the model saw.
    pub fn recording(mut self) -> Self {
        self.seen = Some(Mutex::new(Vec::new()));
        self
    }

    /// Texts submitted so far, oldest first. Always empty unless recording.
    pub fn seen(&self) -> Vec<String> {
        self.seen
            .as_ref()
            .map(|s| s.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .unwrap_or_default()
    }

    fn keyword_scores(text: &str, candidate_labels: &[String]) -> ZeroShotOutput {
        let lower = text.to_lowercase();
        let hits: Vec<(FineLabel, f64)> = KEYWORDS
            .iter()
            .filter(|(needle, _, _)| lower.contains(needle))
            .map(|&(_, label, score)| (label, score))
            .collect();

        let scores = candidate_labels
            .iter()
            .map(|c| match FineLabel::from_phrase(c) {
                Some(FineLabel::Benign) if hits.is_empty() => 0.9,
                Some(FineLabel::Benign) => 0.1,
                Some(fine) => hits
                    .iter()
                    .filter(|(l, _)| *l == fine)
                    .map(|(_, s)| *s)
                    .fold(0.02, f64::max),
                None => 0.0,
            })
            .collect();

        ZeroShotOutput {
            labels: candidate_labels.to_vec(),
            scores,
        }
    }
}

#[async_trait]
impl ZeroShotClassifier for MockClassifier {
    async fn classify(
        &self,
        text: &str,
        candidate_labels: &[String],
        _multi_label: bool,
    ) -> Result<ZeroShotOutput, ClassifierError> {
        if let Some(seen) = &self.seen {
            seen.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(text.to_string());
        }

        match &self.behavior {
            MockBehavior::Keywords => Ok(Self::keyword_scores(text, candidate_labels)),
            MockBehavior::Fixed(pairs) => {
                let (labels, scores) = pairs.iter().cloned().unzip();
                Ok(ZeroShotOutput { labels, scores })
            }
            MockBehavior::Fail(msg) => Err(ClassifierError::Transport(msg.clone())),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
