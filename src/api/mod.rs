//! HTTP surface: per-message classification under `/deberta`, the verdict chain
//! mounted under `/api/mistral`, and discovery/health at the root.

pub mod chain;
pub mod deberta;
pub mod error;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::agent::{AgentSettings, MessageAgent};
use crate::classifier::{build_classifier_from_config, MockClassifier, SharedClassifier};
use crate::config::AppConfig;
use crate::labels;
use crate::verdict::{build_llm_from_config, MockLlm, SharedLlm, VerdictAgent};

pub use error::ApiError;

/// Shared, read-only handles. No conversation state lives here: history travels in
/// request and response bodies.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<MessageAgent>,
    pub verdict: Arc<VerdictAgent>,
}

impl AppState {
    pub fn new(agent: MessageAgent, verdict: VerdictAgent) -> Self {
        Self {
            agent: Arc::new(agent),
            verdict: Arc::new(verdict),
        }
    }

    /// Wire both collaborators from an already validated config.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let classifier = build_classifier_from_config(&cfg.classifier)?;
        let llm = build_llm_from_config(&cfg.llm)?;
        tracing::info!(
            classifier = classifier.provider_name(),
            llm = llm.model_name(),
            threshold = cfg.classifier.threshold,
            context_window = cfg.classifier.context_window,
            use_context = cfg.classifier.use_context,
            "model handles ready"
        );
        Ok(Self::with_backends(
            classifier,
            llm,
            cfg.classifier.candidates(),
            AgentSettings::from(&cfg.classifier),
        ))
    }

    pub fn with_backends(
        classifier: SharedClassifier,
        llm: SharedLlm,
        candidates: Vec<String>,
        settings: AgentSettings,
    ) -> Self {
        Self::new(
            MessageAgent::new(classifier, candidates, settings),
            VerdictAgent::new(llm),
        )
    }

    /// Keyword mocks for both collaborators, default settings.
    pub fn mock() -> Self {
        Self::with_backends(
            Arc::new(MockClassifier::keywords()),
            Arc::new(MockLlm::keywords()),
            labels::candidate_labels(),
            AgentSettings::default(),
        )
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "ok" }))
        .merge(deberta::router())
        .nest("/api", chain::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "API is running. Per-message scoring under /deberta, conversation verdicts under /api/mistral.",
        "paths": {
            "health": "/health",
            "deberta_process": "/deberta/process",
            "deberta_reset": "/deberta/reset",
            "mistral_invoke": "/api/mistral/invoke",
            "mistral_batch": "/api/mistral/batch",
            "mistral_input_schema": "/api/mistral/input_schema",
            "mistral_output_schema": "/api/mistral/output_schema",
            "metrics": "/metrics"
        }
    }))
}
