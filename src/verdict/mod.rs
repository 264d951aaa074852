// src/verdict/mod.rs
//! Conversation-level verdict: the whole conversation plus a starter-message
//! frequency go into a fixed prompt, the LLM reply is parsed and validated
//! into a [`Verdict`].

pub mod llm;
pub mod parse;
pub mod prompt;

use std::time::Instant;

use metrics::{counter, histogram};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::conversation::{render_conversation, ChatTurn};
use crate::metrics as m;

pub use llm::{build_llm_from_config, LlmBackend, LlmError, MockLlm, OllamaBackend, SharedLlm};
pub use parse::parse_verdict;

/// Input of one verdict evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConversationInput {
    /// Conversation rendered as `ROLE: 'text'` lines.
    pub conversation: String,
    /// How often the opening message was seen across senders. Higher values are a
    /// bulk-sent opener signal.
    pub frequency: i64,
}

impl ConversationInput {
    pub fn from_turns(turns: &[ChatTurn], frequency: i64) -> Self {
        Self {
            conversation: render_conversation(turns),
            frequency,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictLabel {
    Scam,
    Benign,
}

impl VerdictLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            VerdictLabel::Scam => "SCAM",
            VerdictLabel::Benign => "BENIGN",
        }
    }
}

/// Conversational scam technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScamTactic {
    WrongNumberIntro,
    PersonalInformationSeeking,
    RapportBuilding,
    FlatteryOrRomance,
    FinancialSupport,
    FinancialGainOpportunity,
    /// Urgency around a fee, tax or deposit that must be paid to unlock money.
    FeePressure,
    ChannelShiftingProposal,
}

impl ScamTactic {
    pub fn as_str(self) -> &'static str {
        match self {
            ScamTactic::WrongNumberIntro => "wrong_number_intro",
            ScamTactic::PersonalInformationSeeking => "personal_information_seeking",
            ScamTactic::RapportBuilding => "rapport_building",
            ScamTactic::FlatteryOrRomance => "flattery_or_romance",
            ScamTactic::FinancialSupport => "financial_support",
            ScamTactic::FinancialGainOpportunity => "financial_gain_opportunity",
            ScamTactic::FeePressure => "fee_pressure",
            ScamTactic::ChannelShiftingProposal => "channel_shifting_proposal",
        }
    }
}

/// Final verdict of a conversational scam analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Verdict {
    /// Labels the conversation as 'SCAM' or 'BENIGN'
    pub label: VerdictLabel,
    /// Confidence score (0.0 to 1.0) for the label
    pub confidence: f64,
    /// A list of scam tactics identified in the conversation.
    #[serde(default)]
    pub tactics: Vec<ScamTactic>,
}

#[derive(Debug, Error)]
pub enum VerdictError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("LLM reply is not valid JSON: {reason}")]
    Parse { reason: String, raw: String },
    #[error("LLM reply violates the verdict schema: {reason}")]
    SchemaViolation { reason: String, raw: String },
}

impl VerdictError {
    /// Short error kind, used for metrics labels and API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            VerdictError::Llm(_) => "llm_error",
            VerdictError::Parse { .. } => "parse_error",
            VerdictError::SchemaViolation { .. } => "schema_violation",
        }
    }

    /// The unparsed LLM reply, when there was one.
    pub fn raw(&self) -> Option<&str> {
        match self {
            VerdictError::Llm(_) => None,
            VerdictError::Parse { raw, .. } | VerdictError::SchemaViolation { raw, .. } => {
                Some(raw)
            }
        }
    }
}

/// Stateless across calls: holds only the backend handle and the rendered format
/// instructions.
pub struct VerdictAgent {
    llm: SharedLlm,
    format_instructions: String,
}

impl VerdictAgent {
    pub fn new(llm: SharedLlm) -> Self {
        Self {
            llm,
            format_instructions: prompt::format_instructions(),
        }
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    pub async fn evaluate(&self, input: &ConversationInput) -> Result<Verdict, VerdictError> {
        let prompt = prompt::render_prompt(&self.format_instructions, input);
        let started = Instant::now();

        let result = match self.llm.generate(&prompt).await {
            Ok(raw) => parse_verdict(&raw),
            Err(e) => Err(VerdictError::from(e)),
        };
        let elapsed_secs = started.elapsed().as_secs_f64();
        histogram!(m::VERDICT_SECONDS).record(elapsed_secs);

        match &result {
            Ok(v) => {
                let outcome = match v.label {
                    VerdictLabel::Scam => "scam",
                    VerdictLabel::Benign => "benign",
                };
                counter!(m::VERDICT_REQUESTS, "outcome" => outcome).increment(1);
                info!(
                    target: "verdict",
                    label = outcome,
                    confidence = v.confidence,
                    tactics = v.tactics.len(),
                    frequency = input.frequency,
                    elapsed_secs,
                    "conversation evaluated"
                );
            }
            Err(e) => {
                counter!(m::VERDICT_REQUESTS, "outcome" => e.kind()).increment(1);
                warn!(target: "verdict", kind = e.kind(), error = %e, elapsed_secs, "verdict failed");
            }
        }
        result
    }

    pub async fn evaluate_turns(
        &self,
        turns: &[ChatTurn],
        frequency: i64,
    ) -> Result<Verdict, VerdictError> {
        self.evaluate(&ConversationInput::from_turns(turns, frequency))
            .await
    }
}
