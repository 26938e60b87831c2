//! Multi-agent debate orchestration.
//!
//! Phase 1 fans out one execution per agent, concurrently, all against
//! the identical context bundle, and waits for every one to settle.
//! Phase 2 merges the successful outputs through a dedicated synthesizer
//! on the precise tier. Failed agents are reported to the caller but
//! excluded from the synthesis prompt.

use futures::future::join_all;
use quorum_core::HubResult;
use quorum_llm::{guardrail, ChatMessage, GenRequest, LlmClient, ModelTier};
use serde_json::json;
use std::sync::Arc;

use crate::context::ContextBundle;
use crate::executor::AgentExecutor;
use crate::prompts;
use crate::types::{AgentResult, AgentSpec};

/// Refusal returned when no agent produced an analysis.
///
/// A fabricated answer may never stand in for a missing one; total
/// failure is reported as explicitly not evaluable.
pub const NO_ANALYSIS_REFUSAL: &str =
    "The requested information could not be evaluated: no agent analysis is available.";

/// Maximum characters of one agent's output quoted into the synthesis
/// prompt.
const AGENT_EXCERPT_CHARS: usize = 1500;

/// Result of a debate.
#[derive(Debug, Clone)]
pub struct DebateOutcome {
    /// The synthesized unified answer
    pub synthesis: String,

    /// Per-agent results in the caller's spec order, failures included
    pub results: Vec<AgentResult>,
}

/// Orchestrates parallel agents and their synthesis.
pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    executor: AgentExecutor,
}

impl Orchestrator {
    /// Create an orchestrator over an LLM client.
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            executor: AgentExecutor::new(llm.clone()),
            llm,
        }
    }

    /// Run the agents concurrently, then synthesize their outputs.
    ///
    /// The relative completion order of the parallel agents never
    /// affects the outcome: results and synthesis labels follow the
    /// caller's spec order. A failed agent contributes an error entry,
    /// not an abort; only a failed synthesizer invocation is an error.
    pub async fn debate(
        &self,
        specs: &[AgentSpec],
        query: &str,
        rag_context: &str,
        history: &[ChatMessage],
    ) -> HubResult<DebateOutcome> {
        let bundle =
            ContextBundle::new(rag_context, query).with_history(history.to_vec());

        tracing::info!(agents = specs.len(), "Starting multi-agent debate");

        // Phase 1: parallel fan-out, waiting for all to settle
        let results: Vec<AgentResult> =
            join_all(specs.iter().map(|spec| self.executor.run(spec, &bundle))).await;

        // Phase 2: synthesis over the successful subset
        let excerpts: Vec<String> = results
            .iter()
            .filter_map(|result| {
                result.display_text().map(|text| {
                    format!(
                        "--- {} ---\n{}",
                        result.agent_name.to_uppercase(),
                        prompts::truncate_chars(&text, AGENT_EXCERPT_CHARS)
                    )
                })
            })
            .collect();

        if excerpts.is_empty() {
            tracing::warn!("All agents failed, returning refusal");
            return Ok(DebateOutcome {
                synthesis: NO_ANALYSIS_REFUSAL.to_string(),
                results,
            });
        }

        let synthesis_prompt = prompts::render(
            prompts::SYNTHESIS_TEMPLATE,
            &json!({
                "agent_count": specs.len(),
                "agent_outputs": excerpts.join("\n\n"),
                "query": query,
            }),
        )?;

        let request = GenRequest::new(
            ModelTier::Precise,
            guardrail::compose(""),
            synthesis_prompt,
        );
        let synthesis = self.llm.generate(&request).await?;

        tracing::info!(
            succeeded = excerpts.len(),
            failed = results.len() - excerpts.len(),
            "Debate synthesized"
        );

        Ok(DebateOutcome { synthesis, results })
    }
}
