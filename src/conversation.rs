//! conversation.rs — chat turns, the caller-owned conversation, and the context
//! window fed to the classifier.

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONTEXT_WINDOW: usize = 8;

/// One message in a conversation. `role` is free-form ("Sender", "Receiver", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub text: String,
}

impl ChatTurn {
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            text: text.into(),
        }
    }
}

/// Ordered, append-only sequence of turns. The server only ever holds a working copy
/// for the duration of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<ChatTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Remove and return the newest turn.
    pub fn pop(&mut self) -> Option<ChatTurn> {
        self.turns.pop()
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }

    pub fn into_turns(self) -> Vec<ChatTurn> {
        self.turns
    }
}

impl From<Vec<ChatTurn>> for Conversation {
    fn from(turns: Vec<ChatTurn>) -> Self {
        Self { turns }
    }
}

/// How much of the conversation the classifier sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindow {
    pub enabled: bool,
    pub size: usize,
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self {
            enabled: true,
            size: DEFAULT_CONTEXT_WINDOW,
        }
    }
}

impl ContextWindow {
    pub fn new(enabled: bool, size: usize) -> Self {
        Self { enabled, size }
    }

    /// Number of turns that `build` would render for a conversation of `len` turns.
    pub fn turns_used(&self, len: usize) -> usize {
        if !self.enabled || self.size == 0 {
            len.min(1)
        } else {
            len.min(self.size)
        }
    }

    /// Render the last `size` turns as `"<role>: <text>"` lines in conversation order.
    /// With the window disabled (or sized 0) only the newest text is returned, bare.
    pub fn build(&self, turns: &[ChatTurn]) -> String {
        if !self.enabled || self.size == 0 {
            return turns.last().map(|t| t.text.clone()).unwrap_or_default();
        }
        let start = turns.len().saturating_sub(self.size);
        turns[start..]
            .iter()
            .map(|t| format!("{}: {}", t.role, t.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Conversation rendering for the LLM verdict prompt: `"<ROLE>: '<text>'"` per line.
pub fn render_conversation(turns: &[ChatTurn]) -> String {
    turns
        .iter()
        .map(|t| format!("{}: '{}'", t.role.to_uppercase(), t.text))
        .collect::<Vec<_>>()
        .join("\n")
}
