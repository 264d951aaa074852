// src/verdict/parse.rs
//! Parse-and-validate for LLM verdict replies.
//!
//! Order: fenced block (if any) → JSON → required keys → typed decode → range check.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{Verdict, VerdictError};

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("fence regex"));

const REQUIRED_KEYS: [&str; 2] = ["label", "confidence"];

/// Body of the first Markdown code fence, else the trimmed reply.
fn json_body(raw: &str) -> &str {
    FENCE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or_else(|| raw.trim())
}

/// Parse `body` as JSON; if prose surrounds the object, retry on the outermost braces.
fn parse_json(body: &str) -> Result<Value, serde_json::Error> {
    match serde_json::from_str(body) {
        Ok(v) => Ok(v),
        Err(e) => match (body.find('{'), body.rfind('}')) {
            (Some(start), Some(end)) if start < end => {
                serde_json::from_str(&body[start..=end]).map_err(|_| e)
            }
            _ => Err(e),
        },
    }
}

pub fn parse_verdict(raw: &str) -> Result<Verdict, VerdictError> {
    let violation = |reason: String| VerdictError::SchemaViolation {
        reason,
        raw: raw.to_string(),
    };

    let value = parse_json(json_body(raw)).map_err(|e| VerdictError::Parse {
        reason: e.to_string(),
        raw: raw.to_string(),
    })?;

    let obj = value
        .as_object()
        .ok_or_else(|| violation("expected a JSON object".to_string()))?;
    if let Some(missing) = REQUIRED_KEYS.iter().find(|k| !obj.contains_key(**k)) {
        return Err(violation(format!("missing key `{missing}`")));
    }

    let mut verdict: Verdict =
        serde_json::from_value(value).map_err(|e| violation(e.to_string()))?;

    if !verdict.confidence.is_finite() || !(0.0..=1.0).contains(&verdict.confidence) {
        return Err(violation(format!(
            "confidence {} is outside [0, 1]",
            verdict.confidence
        )));
    }

    // tactics form a set; keep first occurrence order
    let mut seen = Vec::with_capacity(verdict.tactics.len());
    verdict.tactics.retain(|t| {
        if seen.contains(t) {
            false
        } else {
            seen.push(*t);
            true
        }
    });

    Ok(verdict)
}
