use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::agent::Session;
use crate::conversation::ChatTurn;
use crate::scoring::ScoreRecord;

pub const RESET_MESSAGE: &str =
    "Conversation reset. Please start a new conversation with an empty history.";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/deberta/process", post(process))
        .route("/deberta/reset", post(reset))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub message: String,
    pub role: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub display_html: String,
    pub scores: Vec<ScoreRecord>,
    pub inference_time: f64,
    pub updated_history: Vec<ChatTurn>,
    /// Always set by this server; older servers omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flagged: Option<Vec<String>>,
    #[serde(default)]
    pub ignored: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub status: String,
    pub message: String,
}

/// A fresh session per request: the caller owns the history and gets it back
/// with the new turn appended.
async fn process(
    State(state): State<AppState>,
    Json(req): Json<ProcessRequest>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let mut session = Session::from_history(req.history);
    let res = state
        .agent
        .process(&mut session, &req.role, &req.message)
        .await?;

    Ok(Json(ProcessResponse {
        display_html: res.display,
        scores: res.scores,
        inference_time: res.elapsed_secs,
        updated_history: session.conversation.into_turns(),
        flagged: Some(res.flagged),
        ignored: res.ignored,
    }))
}

/// Informational only: there is no server-side session to clear.
async fn reset() -> Json<ResetResponse> {
    Json(ResetResponse {
        status: "ok".to_string(),
        message: RESET_MESSAGE.to_string(),
    })
}
