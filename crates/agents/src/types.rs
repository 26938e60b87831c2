//! Agent definitions and execution results.

use quorum_llm::{ModelOutput, ModelTier};
use serde::{Deserialize, Serialize};

/// Definition of one specialized agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Agent name, used to label its output in the synthesis
    pub name: String,

    /// Persona and constraints for this agent
    pub role_instructions: String,

    /// Model tier this agent runs on
    pub tier: ModelTier,

    /// Whether the agent is expected to emit JSON
    pub expects_json: bool,
}

impl AgentSpec {
    /// Create a free-text agent.
    pub fn new(
        name: impl Into<String>,
        role_instructions: impl Into<String>,
        tier: ModelTier,
    ) -> Self {
        Self {
            name: name.into(),
            role_instructions: role_instructions.into(),
            tier,
            expects_json: false,
        }
    }

    /// Expect structured JSON output from this agent.
    pub fn expects_json(mut self) -> Self {
        self.expects_json = true;
        self
    }
}

/// What an agent produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "format", content = "content", rename_all = "lowercase")]
pub enum AgentPayload {
    /// Free-form text output
    Text(String),

    /// Output of a JSON-expecting agent; may still be unparsed
    Structured(ModelOutput),
}

impl AgentPayload {
    /// Render the payload as display text.
    pub fn display_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(output) => output.display_text(),
        }
    }
}

/// Outcome of one agent execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AgentOutcome {
    /// The agent produced a payload
    Ok { payload: AgentPayload },

    /// The model invocation failed; detail carries the error message
    Error { detail: String },
}

/// Result of one agent execution.
///
/// A single agent's failure never aborts sibling agents or the
/// orchestration as a whole; it is carried here as an `Error` outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub agent_name: String,
    pub outcome: AgentOutcome,
}

impl AgentResult {
    /// Build a success result.
    pub fn ok(agent_name: impl Into<String>, payload: AgentPayload) -> Self {
        Self {
            agent_name: agent_name.into(),
            outcome: AgentOutcome::Ok { payload },
        }
    }

    /// Build an error result.
    pub fn error(agent_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            outcome: AgentOutcome::Error {
                detail: detail.into(),
            },
        }
    }

    /// Whether the agent succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, AgentOutcome::Ok { .. })
    }

    /// Error detail, present iff the agent failed.
    pub fn error_detail(&self) -> Option<&str> {
        match &self.outcome {
            AgentOutcome::Error { detail } => Some(detail),
            AgentOutcome::Ok { .. } => None,
        }
    }

    /// The payload's display text, if the agent succeeded.
    pub fn display_text(&self) -> Option<String> {
        match &self.outcome {
            AgentOutcome::Ok { payload } => Some(payload.display_text()),
            AgentOutcome::Error { .. } => None,
        }
    }
}

/// Decision produced by the intent gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalDecision {
    /// Whether knowledge retrieval is worth its latency and cost
    pub needs_retrieval: bool,

    /// Query rewritten for semantic search; meaningful only when
    /// `needs_retrieval` is true
    pub refined_query: String,

    /// Diagnostic reason; never used for control flow
    pub reason: String,
}

impl RetrievalDecision {
    /// The fail-open default: retrieve, using the original question.
    pub fn fallback(question: &str) -> Self {
        Self {
            needs_retrieval: true,
            refined_query: question.to_string(),
            reason: "fallback".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_accessors() {
        let ok = AgentResult::ok("auditor", AgentPayload::Text("fine".to_string()));
        assert!(ok.is_ok());
        assert_eq!(ok.error_detail(), None);
        assert_eq!(ok.display_text().unwrap(), "fine");

        let err = AgentResult::error("auditor", "timeout");
        assert!(!err.is_ok());
        assert_eq!(err.error_detail(), Some("timeout"));
        assert_eq!(err.display_text(), None);
    }

    #[test]
    fn test_structured_payload_display() {
        let payload =
            AgentPayload::Structured(ModelOutput::Parsed(json!({"status": "compliant"})));
        assert!(payload.display_text().contains("compliant"));
    }

    #[test]
    fn test_fallback_decision() {
        let decision = RetrievalDecision::fallback("what changed?");
        assert!(decision.needs_retrieval);
        assert_eq!(decision.refined_query, "what changed?");
    }
}
