//! Verdict chain endpoints, invoke/batch/schema style.

use std::time::Instant;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use schemars::schema_for;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiError, AppState};
use crate::verdict::{ConversationInput, Verdict};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mistral/invoke", post(invoke))
        .route("/mistral/batch", post(batch))
        .route("/mistral/input_schema", get(input_schema))
        .route("/mistral/output_schema", get(output_schema))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeRequest {
    pub input: ConversationInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub inputs: Vec<ConversationInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub model: String,
    pub elapsed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeResponse {
    pub output: Verdict,
    pub metadata: RunMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub output: Vec<Verdict>,
    pub metadata: RunMetadata,
}

async fn invoke(
    State(state): State<AppState>,
    Json(req): Json<InvokeRequest>,
) -> Result<Json<InvokeResponse>, ApiError> {
    let started = Instant::now();
    let output = state.verdict.evaluate(&req.input).await?;
    Ok(Json(InvokeResponse {
        output,
        metadata: RunMetadata {
            model: state.verdict.model_name().to_string(),
            elapsed: started.elapsed().as_secs_f64(),
        },
    }))
}

/// Sequential; the first failing input fails the whole batch.
async fn batch(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    let started = Instant::now();
    let mut output = Vec::with_capacity(req.inputs.len());
    for input in &req.inputs {
        output.push(state.verdict.evaluate(input).await?);
    }
    Ok(Json(BatchResponse {
        output,
        metadata: RunMetadata {
            model: state.verdict.model_name().to_string(),
            elapsed: started.elapsed().as_secs_f64(),
        },
    }))
}

async fn input_schema() -> Json<Value> {
    Json(serde_json::to_value(schema_for!(ConversationInput)).unwrap_or_default())
}

async fn output_schema() -> Json<Value> {
    Json(serde_json::to_value(schema_for!(Verdict)).unwrap_or_default())
}
