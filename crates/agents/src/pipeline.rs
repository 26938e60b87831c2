//! End-to-end answer pipeline.
//!
//! The flow every module-level handler repeats, expressed once:
//! rate limit, intent gate, optional retrieval, then a single agent or a
//! multi-agent debate, with deduplicated citations and a best-effort
//! analytics event on the way out.

use quorum_core::analytics::{Analytics, UsageEvent};
use quorum_core::limit::RateLimiter;
use quorum_core::{HubError, HubResult, Identity};
use quorum_knowledge::retriever::{dedup_sources, format_context};
use quorum_knowledge::{EmbeddingGateway, Retriever, Scope, SourceRef};
use quorum_llm::{ChatMessage, LlmClient};
use serde_json::json;
use std::sync::Arc;

use crate::context::ContextBundle;
use crate::executor::AgentExecutor;
use crate::intent::IntentGate;
use crate::orchestrator::Orchestrator;
use crate::types::{AgentResult, AgentSpec, RetrievalDecision};

/// One answerable request.
#[derive(Debug, Clone)]
pub struct AnswerRequest {
    /// Knowledge domain selector
    pub domain: String,

    /// The user's question
    pub question: String,

    /// Optional document under analysis (takes the question's place as
    /// the task input when present, e.g. a contract for the auditor)
    pub document_text: Option<String>,

    /// Optional client narrowing within the caller's tenant
    pub client_id: Option<String>,

    /// Recent conversation history
    pub history: Vec<ChatMessage>,

    /// Agents to run; one runs solo, several debate
    pub agents: Vec<AgentSpec>,
}

impl AnswerRequest {
    /// Create a request with required fields.
    pub fn new(
        domain: impl Into<String>,
        question: impl Into<String>,
        agents: Vec<AgentSpec>,
    ) -> Self {
        Self {
            domain: domain.into(),
            question: question.into(),
            document_text: None,
            client_id: None,
            history: Vec::new(),
            agents,
        }
    }
}

/// What the caller gets back.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    /// The unified answer (single agent output or debate synthesis)
    pub answer: String,

    /// Per-agent detail, failures included
    pub results: Vec<AgentResult>,

    /// Deduplicated citations from retrieval
    pub sources: Vec<SourceRef>,

    /// Whether retrieval ran for this request
    pub dynamic_rag: bool,

    /// The intent gate's decision
    pub decision: RetrievalDecision,
}

/// The assembled answer pipeline.
///
/// Constructed once at process start and shared by reference into
/// request-scoped code; all cross-request state lives in the embedding
/// cache and the rate limiter.
pub struct AnswerPipeline {
    gateway: Arc<EmbeddingGateway>,
    retriever: Retriever,
    gate: IntentGate,
    executor: AgentExecutor,
    orchestrator: Orchestrator,
    limiter: Arc<dyn RateLimiter>,
    analytics: Analytics,
}

impl AnswerPipeline {
    /// Assemble the pipeline from its parts.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        gateway: Arc<EmbeddingGateway>,
        retriever: Retriever,
        limiter: Arc<dyn RateLimiter>,
        analytics: Analytics,
    ) -> Self {
        Self {
            gateway,
            retriever,
            gate: IntentGate::new(llm.clone()),
            executor: AgentExecutor::new(llm.clone()),
            orchestrator: Orchestrator::new(llm),
            limiter,
            analytics,
        }
    }

    /// Answer a request on behalf of a verified identity.
    pub async fn answer(
        &self,
        identity: &Identity,
        request: AnswerRequest,
    ) -> HubResult<AnswerOutcome> {
        if request.agents.is_empty() {
            return Err(HubError::Other(
                "At least one agent is required".to_string(),
            ));
        }

        self.limiter.check(&identity.subject_id, 1.0).await?;

        // Dynamic RAG: let the gate decide whether to search at all
        let decision = self.gate.decide(&request.question, &request.history).await;

        let chunks = if decision.needs_retrieval {
            let query_vector = self.gateway.embed(&decision.refined_query).await?;
            let scope = Scope {
                owner_id: identity.subject_id.clone(),
                client_id: request.client_id.clone(),
            };
            self.retriever
                .retrieve(&query_vector, &scope, &request.domain, None)?
        } else {
            tracing::debug!("Intent gate skipped retrieval: {}", decision.reason);
            Vec::new()
        };

        let knowledge = format_context(&chunks);
        let sources = dedup_sources(&chunks);
        let dynamic_rag = decision.needs_retrieval;

        let task_input = request
            .document_text
            .as_deref()
            .unwrap_or(&request.question);

        let (answer, results) = if request.agents.len() == 1 {
            let bundle = ContextBundle::new(knowledge, task_input)
                .with_history(request.history.clone());
            let result = self.executor.run(&request.agents[0], &bundle).await;

            // Single-agent paths propagate model failure to the caller
            match result.display_text() {
                Some(text) => (text, vec![result]),
                None => {
                    let detail = result
                        .error_detail()
                        .unwrap_or("agent failed without detail")
                        .to_string();
                    return Err(HubError::Model(detail));
                }
            }
        } else {
            let outcome = self
                .orchestrator
                .debate(&request.agents, task_input, &knowledge, &request.history)
                .await?;
            (outcome.synthesis, outcome.results)
        };

        let mut event = UsageEvent::new(
            identity.subject_id.clone(),
            request.domain.clone(),
            "agent_invoke",
        );
        event.metadata = json!({
            "agents": request.agents.len(),
            "dynamic_rag": dynamic_rag,
            "sources_used": chunks.len(),
        });
        self.analytics.record(event).await;

        Ok(AnswerOutcome {
            answer,
            results,
            sources,
            dynamic_rag,
            decision,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_core::analytics::NullSink;
    use quorum_core::limit::LocalBucketLimiter;
    use quorum_knowledge::embeddings::providers::TrigramProvider;
    use quorum_knowledge::ingest::{DocumentMeta, IngestPipeline};
    use quorum_knowledge::{KnowledgeDomain, SqliteStore};
    use quorum_llm::providers::MockLlmClient;
    use quorum_llm::{ModelTier, GLOBAL_GUARDRAIL};
    use std::time::Duration;

    const NEEDS_RAG: &str =
        r#"{"needs_retrieval": true, "refined_query": "termination notice period", "reason": "factual"}"#;
    const SKIPS_RAG: &str =
        r#"{"needs_retrieval": false, "refined_query": "", "reason": "greeting"}"#;

    struct Harness {
        mock: Arc<MockLlmClient>,
        store: Arc<SqliteStore>,
        gateway: Arc<EmbeddingGateway>,
        pipeline: AnswerPipeline,
    }

    fn harness() -> Harness {
        let mock = Arc::new(MockLlmClient::new());
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let gateway = Arc::new(EmbeddingGateway::new(
            Arc::new(TrigramProvider::new(64)),
            2048,
            Duration::from_secs(1800),
        ));

        let pipeline = AnswerPipeline::new(
            mock.clone() as Arc<dyn LlmClient>,
            gateway.clone(),
            Retriever::new(store.clone(), 8),
            Arc::new(LocalBucketLimiter::new(100.0, 10.0)),
            Analytics::new(Arc::new(NullSink)),
        );

        Harness {
            mock,
            store,
            gateway,
            pipeline,
        }
    }

    async fn seed_contract(harness: &Harness) {
        let ingest = IngestPipeline::new(
            harness.store.clone(),
            harness.gateway.clone(),
            500,
            50,
        );
        ingest
            .ingest_text(
                KnowledgeDomain::Legal,
                "The termination notice period is ninety days for either party.",
                DocumentMeta::new("tenant-a", "Service Contract", "contract.txt", "contract"),
                64,
            )
            .await
            .unwrap();
    }

    fn single_agent() -> Vec<AgentSpec> {
        vec![AgentSpec::new(
            "researcher",
            "You research the legal knowledge base.",
            ModelTier::Precise,
        )]
    }

    #[tokio::test]
    async fn test_answer_with_retrieval_and_sources() {
        let h = harness();
        seed_contract(&h).await;

        h.mock.enqueue_text(NEEDS_RAG);
        h.mock.enqueue_text("The notice period is ninety days.");

        let outcome = h
            .pipeline
            .answer(
                &Identity::new("tenant-a"),
                AnswerRequest::new("legal", "how long is the notice period?", single_agent()),
            )
            .await
            .unwrap();

        assert!(outcome.dynamic_rag);
        assert_eq!(outcome.answer, "The notice period is ninety days.");
        assert_eq!(outcome.sources.len(), 1);
        assert_eq!(outcome.sources[0].title, "Service Contract");

        // The agent call carried the knowledge block and the guardrail
        let agent_call = &h.mock.calls()[1];
        assert!(agent_call.prompt.contains("[KNOWLEDGE_BASE]"));
        assert!(agent_call.prompt.contains("ninety days"));
        assert!(agent_call.system.starts_with(GLOBAL_GUARDRAIL));
    }

    #[tokio::test]
    async fn test_greeting_skips_retrieval_entirely() {
        let h = harness();

        h.mock.enqueue_text(SKIPS_RAG);
        h.mock.enqueue_text("Hello! How can I help?");

        let outcome = h
            .pipeline
            .answer(
                &Identity::new("tenant-a"),
                AnswerRequest::new("legal", "good morning!", single_agent()),
            )
            .await
            .unwrap();

        assert!(!outcome.dynamic_rag);
        assert!(outcome.sources.is_empty());
        // No knowledge block reached the agent
        assert!(!h.mock.calls()[1].prompt.contains("[KNOWLEDGE_BASE]"));
    }

    #[tokio::test]
    async fn test_empty_knowledge_base_prompt_has_no_context() {
        let h = harness();

        h.mock.enqueue_text(NEEDS_RAG);
        h.mock
            .enqueue_text("This information was not found in the available knowledge base.");

        let outcome = h
            .pipeline
            .answer(
                &Identity::new("tenant-with-no-documents"),
                AnswerRequest::new("legal", "what is our notice period?", single_agent()),
            )
            .await
            .unwrap();

        assert!(outcome.dynamic_rag);
        assert!(outcome.sources.is_empty());
        assert!(outcome.answer.contains("not found"));

        // Retrieval ran and came back empty; the agent saw no knowledge
        // block but did see the anti-fabrication rules
        let agent_call = &h.mock.calls()[1];
        assert!(!agent_call.prompt.contains("[KNOWLEDGE_BASE]"));
        assert!(agent_call.system.contains("state EXPLICITLY that it was not found"));
    }

    /// Provider wrapper that counts how many texts reach the model.
    #[derive(Debug)]
    struct CountingProvider {
        inner: TrigramProvider,
        texts_embedded: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl quorum_knowledge::embeddings::EmbeddingProvider for CountingProvider {
        fn provider_name(&self) -> &str {
            "counting"
        }

        fn model_name(&self) -> &str {
            self.inner.model_name()
        }

        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }

        async fn embed_batch(
            &self,
            texts: &[String],
        ) -> quorum_core::HubResult<Vec<Vec<f32>>> {
            self.texts_embedded
                .fetch_add(texts.len(), std::sync::atomic::Ordering::SeqCst);
            self.inner.embed_batch(texts).await
        }
    }

    #[tokio::test]
    async fn test_repeated_question_embeds_once() {
        let mock = Arc::new(MockLlmClient::new());
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let provider = Arc::new(CountingProvider {
            inner: TrigramProvider::new(64),
            texts_embedded: std::sync::atomic::AtomicUsize::new(0),
        });
        let gateway = Arc::new(EmbeddingGateway::new(
            provider.clone(),
            2048,
            Duration::from_secs(1800),
        ));
        let pipeline = AnswerPipeline::new(
            mock.clone() as Arc<dyn LlmClient>,
            gateway,
            Retriever::new(store, 8),
            Arc::new(LocalBucketLimiter::new(100.0, 10.0)),
            Analytics::new(Arc::new(NullSink)),
        );

        for _ in 0..2 {
            mock.enqueue_text(NEEDS_RAG);
            mock.enqueue_text("Ninety days.");
        }

        let identity = Identity::new("tenant-a");
        for _ in 0..2 {
            pipeline
                .answer(
                    &identity,
                    AnswerRequest::new("legal", "how long is the notice period?", single_agent()),
                )
                .await
                .unwrap();
        }

        // Both requests refined to the same query; the second one was a
        // cache hit and never reached the embedding model
        assert_eq!(
            provider
                .texts_embedded
                .load(std::sync::atomic::Ordering::SeqCst),
            1
        );
    }

    #[tokio::test]
    async fn test_unknown_domain_degrades_to_no_context() {
        let h = harness();
        seed_contract(&h).await;

        h.mock.enqueue_text(NEEDS_RAG);
        h.mock.enqueue_text("answered without context");

        let outcome = h
            .pipeline
            .answer(
                &Identity::new("tenant-a"),
                AnswerRequest::new("payroll", "question", single_agent()),
            )
            .await
            .unwrap();

        assert!(outcome.sources.is_empty());
        assert_eq!(outcome.answer, "answered without context");
    }

    #[tokio::test]
    async fn test_single_agent_failure_propagates() {
        let h = harness();

        h.mock.enqueue_text(SKIPS_RAG);
        h.mock.enqueue_failure("model melted");

        let result = h
            .pipeline
            .answer(
                &Identity::new("tenant-a"),
                AnswerRequest::new("legal", "hi", single_agent()),
            )
            .await;

        assert!(matches!(result, Err(HubError::Model(_))));
    }

    #[tokio::test]
    async fn test_debate_degrades_quietly_on_partial_failure() {
        let h = harness();

        h.mock.enqueue_text(SKIPS_RAG);
        h.mock.enqueue_text("auditor view");
        h.mock.enqueue_failure("researcher down");
        h.mock.enqueue_text("combined synthesis");

        let agents = vec![
            AgentSpec::new("auditor", "Audit.", ModelTier::Precise),
            AgentSpec::new("researcher", "Research.", ModelTier::Precise),
        ];

        let outcome = h
            .pipeline
            .answer(
                &Identity::new("tenant-a"),
                AnswerRequest::new("legal", "assess this", agents),
            )
            .await
            .unwrap();

        assert_eq!(outcome.answer, "combined synthesis");
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(
            outcome.results.iter().filter(|r| !r.is_ok()).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_before_any_model_call() {
        let mock = Arc::new(MockLlmClient::new());
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let gateway = Arc::new(EmbeddingGateway::new(
            Arc::new(TrigramProvider::new(64)),
            2048,
            Duration::from_secs(1800),
        ));
        let pipeline = AnswerPipeline::new(
            mock.clone() as Arc<dyn LlmClient>,
            gateway,
            Retriever::new(store, 8),
            Arc::new(LocalBucketLimiter::new(1.0, 0.01)),
            Analytics::new(Arc::new(NullSink)),
        );

        let identity = Identity::new("tenant-a");
        mock.enqueue_text(SKIPS_RAG);
        mock.enqueue_text("ok");
        pipeline
            .answer(
                &identity,
                AnswerRequest::new("legal", "hi", single_agent()),
            )
            .await
            .unwrap();

        let rejected = pipeline
            .answer(
                &identity,
                AnswerRequest::new("legal", "hi again", single_agent()),
            )
            .await;

        assert!(matches!(rejected, Err(HubError::RateLimited { .. })));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_document_text_replaces_question_as_task_input() {
        let h = harness();

        h.mock.enqueue_text(SKIPS_RAG);
        h.mock.enqueue_text("audited");

        let mut request =
            AnswerRequest::new("legal", "please audit", single_agent());
        request.document_text = Some("FULL CONTRACT TEXT".to_string());

        h.pipeline
            .answer(&Identity::new("tenant-a"), request)
            .await
            .unwrap();

        let agent_call = &h.mock.calls()[1];
        assert!(agent_call.prompt.contains("FULL CONTRACT TEXT"));
    }
}
