//! Conversation memory compaction.
//!
//! Every N turns the recent conversation is condensed into a 2-3
//! sentence summary on the fast tier. This is a cost control: the
//! summary replaces full history in later prompts.

use quorum_core::HubResult;
use quorum_llm::{guardrail, ChatRole, GenRequest, LlmClient, ModelTier};
use std::sync::Arc;

use crate::prompts;
use crate::session::ConversationTurn;

/// Default compaction interval, in turns.
pub const SUMMARY_INTERVAL: usize = 3;

/// Per-turn character cap in the summarization prompt.
const TURN_CHARS: usize = 500;

/// Conversation summarizer.
pub struct Compactor {
    llm: Arc<dyn LlmClient>,
    interval: usize,
}

impl Compactor {
    /// Create a compactor with the given interval.
    pub fn new(llm: Arc<dyn LlmClient>, interval: usize) -> Self {
        Self { llm, interval }
    }

    /// Whether a conversation of `turn_count` turns is due for
    /// compaction: true exactly on positive interval multiples.
    pub fn should_summarize(&self, turn_count: usize) -> bool {
        turn_count > 0 && turn_count % self.interval == 0
    }

    /// Summarize the recent conversation.
    ///
    /// Conversations of two turns or fewer are too short to warrant a
    /// summary and yield an empty string without a model call.
    pub async fn summarize(&self, turns: &[ConversationTurn]) -> HubResult<String> {
        if turns.len() <= 2 {
            return Ok(String::new());
        }

        let start = turns.len().saturating_sub(self.interval * 2);
        let conversation = turns[start..]
            .iter()
            .map(|turn| {
                let speaker = match turn.role {
                    ChatRole::User => "User",
                    ChatRole::Assistant => "Assistant",
                };
                format!(
                    "{}: {}",
                    speaker,
                    prompts::truncate_chars(&turn.content, TURN_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let request = GenRequest::new(
            ModelTier::Fast,
            guardrail::compose(prompts::SUMMARY_INSTRUCTION),
            conversation,
        );

        self.llm.generate(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_llm::providers::MockLlmClient;

    fn compactor_with_mock() -> (Arc<MockLlmClient>, Compactor) {
        let mock = Arc::new(MockLlmClient::new());
        let compactor = Compactor::new(mock.clone(), SUMMARY_INTERVAL);
        (mock, compactor)
    }

    #[test]
    fn test_should_summarize_truth_table() {
        let (_, compactor) = compactor_with_mock();

        for n in 0..=100usize {
            let expected = n > 0 && n % SUMMARY_INTERVAL == 0;
            assert_eq!(compactor.should_summarize(n), expected, "n = {}", n);
        }
    }

    #[tokio::test]
    async fn test_short_conversation_skips_model() {
        let (mock, compactor) = compactor_with_mock();

        let turns = vec![
            ConversationTurn::user("hi"),
            ConversationTurn::assistant("hello"),
        ];
        let summary = compactor.summarize(&turns).await.unwrap();

        assert_eq!(summary, "");
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_summarize_windows_and_truncates() {
        let (mock, compactor) = compactor_with_mock();
        mock.enqueue_text("User wants claims data; totals already shown.");

        let mut turns: Vec<ConversationTurn> = (0..10)
            .map(|i| ConversationTurn::user(format!("turn-{}", i)))
            .collect();
        turns.push(ConversationTurn::assistant("a".repeat(2000)));

        let summary = compactor.summarize(&turns).await.unwrap();
        assert!(summary.contains("claims data"));

        let call = &mock.calls()[0];
        // Window is the last 2 x interval turns
        assert!(!call.prompt.contains("turn-4"));
        assert!(call.prompt.contains("turn-5"));
        // Long turns are truncated
        assert!(!call.prompt.contains(&"a".repeat(600)));
        // Standing instruction rides in the system text
        assert!(call.system.contains("2-3 objective sentences"));
        assert_eq!(call.tier, ModelTier::Fast);
    }

    #[tokio::test]
    async fn test_session_compaction_overwrites_summary() {
        use crate::session::SessionMemory;

        let (mock, compactor) = compactor_with_mock();
        mock.enqueue_text("first summary");
        mock.enqueue_text("second summary");

        let mut session = SessionMemory::new();
        session.push_user("q1");
        session.push_assistant("a1");
        session.push_user("q2");

        assert!(session.maybe_compact(&compactor).await.unwrap());
        assert_eq!(session.summary(), "first summary");

        session.push_assistant("a2");
        assert!(!session.maybe_compact(&compactor).await.unwrap());

        session.push_user("q3");
        session.push_assistant("a3");
        assert!(session.maybe_compact(&compactor).await.unwrap());
        assert_eq!(session.summary(), "second summary");
    }
}
