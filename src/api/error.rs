//! Unified API error handling: every failure is a JSON body with a stable error kind.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::ClassifierError;
use crate::verdict::VerdictError;

/// Standard error response format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type/code
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Unparsed model reply, for diagnosing parse failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error(transparent)]
    Verdict(#[from] VerdictError),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Classifier(_) => "upstream_error",
            ApiError::Verdict(VerdictError::Llm(_)) => "upstream_error",
            ApiError::Verdict(e) => e.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Both model collaborators sit behind us; their failures are gateway errors.
        let status = StatusCode::BAD_GATEWAY;
        let error_type = self.kind();

        tracing::error!(
            error_type,
            status = status.as_u16(),
            message = %self,
            "API error"
        );

        let raw = match &self {
            ApiError::Verdict(e) => e.raw().map(str::to_string),
            ApiError::Classifier(_) => None,
        };

        (
            status,
            Json(ErrorResponse {
                error: error_type.to_string(),
                message: self.to_string(),
                raw,
            }),
        )
            .into_response()
    }
}
