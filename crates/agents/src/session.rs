//! Session conversation memory.
//!
//! Turns are append-only and strictly time-ordered. Beyond a short
//! window, full history is replaced by the rolling summary in subsequent
//! prompts, bounding token growth independent of conversation length.

use chrono::{DateTime, Utc};
use quorum_core::HubResult;
use quorum_llm::{ChatMessage, ChatRole};
use serde::{Deserialize, Serialize};

use crate::memory::Compactor;

/// One turn of a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    /// Create a user turn stamped now.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Create an assistant turn stamped now.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Project the turn into a prompt message.
    pub fn to_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Append-only conversation log with a rolling summary.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SessionMemory {
    turns: Vec<ConversationTurn>,
    summary: String,
}

impl SessionMemory {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user turn.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(ConversationTurn::user(content));
    }

    /// Append an assistant turn.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(ConversationTurn::assistant(content));
    }

    /// Number of turns so far.
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// The rolling summary; empty until the first compaction.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// The most recent `n` turns as prompt messages.
    pub fn recent(&self, n: usize) -> Vec<ChatMessage> {
        let start = self.turns.len().saturating_sub(n);
        self.turns[start..].iter().map(|t| t.to_message()).collect()
    }

    /// Regenerate the rolling summary when the turn count crosses an
    /// interval boundary. The summary is overwritten, not appended.
    ///
    /// Returns whether a compaction ran.
    pub async fn maybe_compact(&mut self, compactor: &Compactor) -> HubResult<bool> {
        if !compactor.should_summarize(self.turns.len()) {
            return Ok(false);
        }

        self.summary = compactor.summarize(&self.turns).await?;
        tracing::debug!(turns = self.turns.len(), "Compacted conversation memory");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turns_are_ordered() {
        let mut session = SessionMemory::new();
        session.push_user("first");
        session.push_assistant("second");
        session.push_user("third");

        let turns = session.turns();
        assert_eq!(turns.len(), 3);
        assert!(turns[0].created_at <= turns[1].created_at);
        assert!(turns[1].created_at <= turns[2].created_at);
        assert_eq!(turns[2].content, "third");
    }

    #[test]
    fn test_recent_window() {
        let mut session = SessionMemory::new();
        for i in 0..10 {
            session.push_user(format!("turn {}", i));
        }

        let recent = session.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].content, "turn 7");
    }

    #[test]
    fn test_recent_on_short_session() {
        let mut session = SessionMemory::new();
        session.push_user("only");
        assert_eq!(session.recent(6).len(), 1);
    }
}
