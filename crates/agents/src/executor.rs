//! Agent execution with per-agent failure isolation.

use quorum_llm::{guardrail, parse_model_output, GenRequest, LlmClient};
use std::sync::Arc;

use crate::context::ContextBundle;
use crate::types::{AgentPayload, AgentResult, AgentSpec};

/// Runs one agent against a context bundle.
///
/// Every invocation's effective instructions are the guardrail policy
/// composed with the agent's role instructions; there is no path around
/// that. Any failure while invoking the model is converted into an
/// error-outcome [`AgentResult`] and never propagates to siblings.
pub struct AgentExecutor {
    llm: Arc<dyn LlmClient>,
}

impl AgentExecutor {
    /// Create an executor over an LLM client.
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Run a single agent.
    pub async fn run(&self, spec: &AgentSpec, bundle: &ContextBundle) -> AgentResult {
        let prompt = match bundle.task_prompt() {
            Ok(prompt) => prompt,
            Err(e) => return AgentResult::error(spec.name.clone(), e.to_string()),
        };

        let system = guardrail::compose(&spec.role_instructions);
        let request =
            GenRequest::new(spec.tier, system, prompt).with_history(bundle.history.clone());

        tracing::debug!(agent = %spec.name, tier = spec.tier.as_str(), "Running agent");

        match self.llm.generate(&request).await {
            Ok(text) => {
                let payload = if spec.expects_json {
                    AgentPayload::Structured(parse_model_output(&text))
                } else {
                    AgentPayload::Text(text)
                };
                AgentResult::ok(spec.name.clone(), payload)
            }
            Err(e) => {
                tracing::warn!(agent = %spec.name, "Agent invocation failed: {}", e);
                AgentResult::error(spec.name.clone(), e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgentOutcome;
    use quorum_llm::providers::MockLlmClient;
    use quorum_llm::{ModelOutput, ModelTier, GLOBAL_GUARDRAIL};

    fn executor_with_mock() -> (Arc<MockLlmClient>, AgentExecutor) {
        let mock = Arc::new(MockLlmClient::new());
        let executor = AgentExecutor::new(mock.clone());
        (mock, executor)
    }

    #[tokio::test]
    async fn test_run_free_text_agent() {
        let (mock, executor) = executor_with_mock();
        mock.enqueue_text("the clause is standard");

        let spec = AgentSpec::new("drafter", "You draft legal text.", ModelTier::Precise);
        let result = executor
            .run(&spec, &ContextBundle::new("", "draft a clause"))
            .await;

        assert!(result.is_ok());
        assert_eq!(result.display_text().unwrap(), "the clause is standard");
    }

    #[tokio::test]
    async fn test_guardrail_always_prefixes_instructions() {
        let (mock, executor) = executor_with_mock();
        mock.enqueue_text("ok");

        let spec = AgentSpec::new("auditor", "You audit contracts.", ModelTier::Precise);
        executor
            .run(&spec, &ContextBundle::new("", "audit"))
            .await;

        let calls = mock.calls();
        assert!(calls[0].system.starts_with(GLOBAL_GUARDRAIL));
        assert!(calls[0].system.contains("You audit contracts."));
    }

    #[tokio::test]
    async fn test_json_agent_parses_fenced_output() {
        let (mock, executor) = executor_with_mock();
        mock.enqueue_text("```json\n{\"status\": \"compliant\"}\n```");

        let spec =
            AgentSpec::new("auditor", "Audit.", ModelTier::Precise).expects_json();
        let result = executor
            .run(&spec, &ContextBundle::new("", "audit"))
            .await;

        match result.outcome {
            AgentOutcome::Ok {
                payload: AgentPayload::Structured(ModelOutput::Parsed(value)),
            } => assert_eq!(value["status"], "compliant"),
            other => panic!("Expected parsed payload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_json_agent_falls_back_to_unparsed() {
        let (mock, executor) = executor_with_mock();
        mock.enqueue_text("I will not produce JSON today.");

        let spec = AgentSpec::new("auditor", "Audit.", ModelTier::Precise).expects_json();
        let result = executor
            .run(&spec, &ContextBundle::new("", "audit"))
            .await;

        // Degraded but present: still a success, payload tagged unparsed
        match result.outcome {
            AgentOutcome::Ok {
                payload: AgentPayload::Structured(ModelOutput::Unparsed(raw)),
            } => assert!(raw.contains("will not produce JSON")),
            other => panic!("Expected unparsed payload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_model_failure_becomes_error_result() {
        let (mock, executor) = executor_with_mock();
        mock.enqueue_failure("upstream quota exceeded");

        let spec = AgentSpec::new("watcher", "Watch.", ModelTier::Fast);
        let result = executor
            .run(&spec, &ContextBundle::new("", "watch"))
            .await;

        assert!(!result.is_ok());
        assert!(result.error_detail().unwrap().contains("quota exceeded"));
    }
}
