//! Dynamic-RAG intent gate.
//!
//! Decides whether retrieval is worth its latency and cost before any
//! embedding or nearest-neighbor work happens. Greetings and
//! conversational follow-ups skip the round trip entirely.
//!
//! The gate fails open: on any invocation or parsing failure the
//! decision defaults to retrieving with the original question — recall
//! matters more than cost in the failure case.

use quorum_llm::{guardrail, parse_model_output, ChatMessage, ChatRole, GenRequest, LlmClient, ModelOutput, ModelTier};
use serde_json::json;
use std::sync::Arc;

use crate::prompts;
use crate::types::RetrievalDecision;

/// Turns of history shown to the gate.
const HISTORY_TURNS: usize = 4;

/// Per-turn character cap in the gate prompt.
const TURN_CHARS: usize = 200;

/// The retrieval decision gate.
pub struct IntentGate {
    llm: Arc<dyn LlmClient>,
}

impl IntentGate {
    /// Create a gate over an LLM client.
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Decide whether retrieval is needed for this question.
    ///
    /// Runs on the fast tier; never fails.
    pub async fn decide(&self, question: &str, history: &[ChatMessage]) -> RetrievalDecision {
        let history_text = render_history(history);

        let prompt = match prompts::render(
            prompts::INTENT_TEMPLATE,
            &json!({
                "history": history_text,
                "question": question,
            }),
        ) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!("Intent prompt rendering failed: {}", e);
                return RetrievalDecision::fallback(question);
            }
        };

        let request = GenRequest::new(ModelTier::Fast, guardrail::compose(""), prompt);

        let raw = match self.llm.generate(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Intent detection failed, assuming retrieval needed: {}", e);
                return RetrievalDecision::fallback(question);
            }
        };

        match parse_model_output(&raw) {
            ModelOutput::Parsed(value) => {
                let needs_retrieval = value
                    .get("needs_retrieval")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(true);

                // An empty refined query on a positive decision falls
                // back to the original question
                let refined_query = value
                    .get("refined_query")
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.is_empty())
                    .unwrap_or(question)
                    .to_string();

                let reason = value
                    .get("reason")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string();

                RetrievalDecision {
                    needs_retrieval,
                    refined_query,
                    reason,
                }
            }
            ModelOutput::Unparsed(_) => {
                tracing::warn!("Intent decision was not valid JSON, assuming retrieval needed");
                RetrievalDecision::fallback(question)
            }
        }
    }
}

/// Render the last few turns for the gate prompt.
fn render_history(history: &[ChatMessage]) -> String {
    if history.is_empty() {
        return "(none)".to_string();
    }

    let start = history.len().saturating_sub(HISTORY_TURNS);
    history[start..]
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
        .join("\n")
}
