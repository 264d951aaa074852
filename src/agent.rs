//! Per-message classification cycle.
//!
//! append → build context → classify → aggregate + flag → format.
//!
//! [`MessageAgent`] is long-lived and holds only the shared model handle and fixed
//! settings. Conversation state travels in a request-scoped [`Session`] passed in
//! explicitly, so concurrent requests never share mutable state.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::classifier::{ClassifierError, SharedClassifier};
use crate::config::ClassifierConfig;
use crate::conversation::{ChatTurn, ContextWindow, Conversation};
use crate::logging::anon_id;
use crate::metrics as m;
use crate::scoring::{self, ScoreRecord, DEFAULT_FLAG_THRESHOLD};

/// Display text returned for empty/whitespace-only input.
pub const IGNORED_MARKER: &str = "[empty message ignored]";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSettings {
    pub threshold: f64,
    pub window: ContextWindow,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_FLAG_THRESHOLD,
            window: ContextWindow::default(),
        }
    }
}

impl From<&ClassifierConfig> for AgentSettings {
    fn from(cfg: &ClassifierConfig) -> Self {
        Self {
            threshold: cfg.threshold,
            window: ContextWindow::new(cfg.use_context, cfg.context_window),
        }
    }
}

/// Working copy of a conversation plus the last computed score table.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub conversation: Conversation,
    pub last_scores: Vec<ScoreRecord>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            conversation: Conversation::new(),
            last_scores: scoring::zero_scores(),
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from caller-supplied history with a zeroed score table.
    pub fn from_history(history: impl Into<Conversation>) -> Self {
        Self {
            conversation: history.into(),
            last_scores: scoring::zero_scores(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageResult {
    /// Message text (HTML-escaped) followed by the signal annotation.
    pub display: String,
    pub scores: Vec<ScoreRecord>,
    pub flagged: Vec<String>,
    pub elapsed_secs: f64,
    pub ignored: bool,
}

pub struct MessageAgent {
    classifier: SharedClassifier,
    candidates: Arc<[String]>,
    settings: AgentSettings,
}

impl MessageAgent {
    pub fn new(classifier: SharedClassifier, candidates: Vec<String>, settings: AgentSettings) -> Self {
        Self {
            classifier,
            candidates: candidates.into(),
            settings,
        }
    }

    pub fn settings(&self) -> AgentSettings {
        self.settings
    }

    /// Run one message through the cycle.
    ///
    /// Empty input returns the ignored marker with the session's previous scores and
    /// leaves the session untouched. On classifier failure the appended turn is
    /// rolled back, so the session is unchanged as well.
    pub async fn process(
        &self,
        session: &mut Session,
        role: &str,
        message: &str,
    ) -> Result<MessageResult, ClassifierError> {
        let message = message.trim();
        if message.is_empty() {
            debug!(target: "classifier", role, "empty message ignored");
            counter!(m::CLASSIFIER_IGNORED).increment(1);
            return Ok(MessageResult {
                display: IGNORED_MARKER.to_string(),
                scores: session.last_scores.clone(),
                flagged: Vec::new(),
                elapsed_secs: 0.0,
                ignored: true,
            });
        }

        session.conversation.push(ChatTurn::new(role, message));

        let turns = session.conversation.turns();
        let context = self.settings.window.build(turns);
        let context_turns = self.settings.window.turns_used(turns.len());

        counter!(m::CLASSIFIER_REQUESTS).increment(1);
        let started = Instant::now();
        let output = match self
            .classifier
            .classify(&context, &self.candidates, true)
            .await
        {
            Ok(out) => out,
            Err(e) => {
                session.conversation.pop();
                counter!(m::CLASSIFIER_ERRORS).increment(1);
                warn!(
                    target: "classifier",
                    provider = self.classifier.provider_name(),
                    error = %e,
                    "classification failed"
                );
                return Err(e);
            }
        };
        let elapsed_secs = started.elapsed().as_secs_f64();
        histogram!(m::CLASSIFIER_SECONDS).record(elapsed_secs);

        let scores = scoring::aggregate(output.pairs());
        let flagged = scoring::flag_signals(&scores, self.settings.threshold);
        for r in scoring::flagged_records(&scores, self.settings.threshold) {
            counter!(m::CLASSIFIER_FLAGGED, "label" => r.label.as_str()).increment(1);
        }
        session.last_scores = scores.clone();

        info!(
            target: "classifier",
            id = %anon_id(message),
            role,
            context_turns,
            elapsed_secs,
            flagged = ?flagged,
            "message classified"
        );

        Ok(MessageResult {
            display: format_display(message, &flagged),
            scores,
            flagged,
            elapsed_secs,
            ignored: false,
        })
    }
}

/// Message text plus a one-line annotation listing flagged signals (or none).
pub fn format_display(message: &str, flagged: &[String]) -> String {
    let text = html_escape::encode_text(message);
    let status = if flagged.is_empty() {
        "<br><span style='font-size:12px; color:green;'>✅ No strong scam signals</span>"
            .to_string()
    } else {
        format!(
            "<br><span style='font-size:12px; color:yellow;'>⚠️ Potential signals: {}</span>",
            flagged.join(", ")
        )
    };
    format!("{text}{status}")
}
