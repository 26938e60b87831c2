//! Request and conversation types for LLM invocation.

use serde::{Deserialize, Serialize};

/// Maximum number of recent turns forwarded to the model.
///
/// Longer histories are expected to have been compacted into a rolling
/// summary by the conversation memory layer.
pub const HISTORY_WINDOW: usize = 6;

/// Model tier routing choice.
///
/// Each task picks the cheapest tier that is adequate: intent detection
/// and summaries run on `Fast`, auditing and synthesis on `Precise`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Fast/cheap model class
    Fast,
    /// Slower, more precise model class
    Precise,
}

impl ModelTier {
    /// Parse a tier from its canonical name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fast" => Some(Self::Fast),
            "precise" => Some(Self::Precise),
            _ => None,
        }
    }

    /// Get the canonical tier name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Precise => "precise",
        }
    }
}

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single role-tagged message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// LLM generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenRequest {
    /// Model tier to route to
    pub tier: ModelTier,

    /// Effective system instructions (guardrail already composed in)
    pub system: String,

    /// The user prompt for this turn
    pub prompt: String,

    /// Recent conversation history, oldest first
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

impl GenRequest {
    /// Create a request with required fields.
    pub fn new(tier: ModelTier, system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            tier,
            system: system.into(),
            prompt: prompt.into(),
            history: Vec::new(),
        }
    }

    /// Attach conversation history.
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    /// The history window actually sent to the model: the most recent
    /// [`HISTORY_WINDOW`] turns, in order.
    pub fn recent_history(&self) -> &[ChatMessage] {
        let start = self.history.len().saturating_sub(HISTORY_WINDOW);
        &self.history[start..]
    }
}
