//! Ask command handler.
//!
//! Wires the full pipeline together: LLM client, embedding gateway,
//! retriever, rate limiter, and analytics, then routes the question
//! through a single agent or the domain's debate panel.

use clap::Args;
use quorum_agents::{AnswerPipeline, AnswerRequest, AgentSpec};
use quorum_core::analytics::{Analytics, TracingSink};
use quorum_core::limit::create_limiter;
use quorum_core::{HubConfig, HubError, HubResult, Identity};
use quorum_knowledge::{EmbeddingGateway, Retriever, SqliteStore};
use quorum_llm::{create_client, ModelTier};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Ask a question through the dynamic-RAG agent pipeline
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Knowledge domain (ghost, legal, query, insurance)
    #[arg(short, long, default_value = "legal")]
    pub domain: String,

    /// Agent to run (defaults to the domain's primary agent)
    #[arg(short, long)]
    pub agent: Option<String>,

    /// Run the domain's debate panel instead of a single agent
    #[arg(long)]
    pub debate: bool,

    /// Narrow retrieval to one client within the tenant
    #[arg(long)]
    pub client: Option<String>,

    /// Document file to analyze (e.g. a contract for the auditor)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Output full per-agent detail as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(
        &self,
        config: &HubConfig,
        store_path: &Path,
        owner: &str,
    ) -> HubResult<()> {
        let llm = create_client(config)?;
        let gateway = Arc::new(EmbeddingGateway::from_settings(&config.embedding)?);
        let store = Arc::new(SqliteStore::open(store_path)?);
        let retriever = Retriever::new(store, config.retrieval.limit);
        let limiter = create_limiter(&config.rate_limit, None);
        let analytics = Analytics::new(Arc::new(TracingSink));

        let pipeline = AnswerPipeline::new(llm, gateway, retriever, limiter, analytics);

        let agents = select_agents(&self.domain, self.agent.as_deref(), self.debate)?;

        let mut request =
            AnswerRequest::new(self.domain.clone(), self.question.clone(), agents);
        request.client_id = self.client.clone();
        if let Some(ref path) = self.file {
            request.document_text = Some(std::fs::read_to_string(path)?);
        }

        let identity = Identity::new(owner);
        let outcome = pipeline.answer(&identity, request).await?;

        println!("{}", outcome.answer);

        if !outcome.sources.is_empty() {
            println!("\nSources:");
            for source in &outcome.sources {
                println!("  [{}] {}", source.doc_type, source.title);
            }
        }

        if self.json {
            let detail = serde_json::json!({
                "dynamic_rag": outcome.dynamic_rag,
                "decision": outcome.decision,
                "results": outcome.results,
            });
            println!("\n{}", serde_json::to_string_pretty(&detail)?);
        }

        Ok(())
    }
}

/// Resolve the agents to run for a domain.
fn select_agents(
    domain: &str,
    agent: Option<&str>,
    debate: bool,
) -> HubResult<Vec<AgentSpec>> {
    let panel = domain_panel(domain);
    if panel.is_empty() {
        return Err(HubError::Other(format!(
            "Unknown domain '{}'. Use: ghost, legal, query, insurance",
            domain
        )));
    }

    if debate {
        // The debate panel: every JSON-disciplined analyst in the domain
        let debaters: Vec<AgentSpec> = panel
            .iter()
            .filter(|spec| spec.expects_json)
            .cloned()
            .collect();
        if debaters.len() >= 2 {
            return Ok(debaters);
        }
        return Ok(panel);
    }

    match agent {
        Some(name) => panel
            .iter()
            .find(|spec| spec.name == name)
            .cloned()
            .map(|spec| vec![spec])
            .ok_or_else(|| {
                HubError::Other(format!(
                    "Agent '{}' not found in domain '{}'. Available: {}",
                    name,
                    domain,
                    panel
                        .iter()
                        .map(|s| s.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            }),
        None => Ok(vec![panel[0].clone()]),
    }
}

/// Built-in agent panel per domain.
fn domain_panel(domain: &str) -> Vec<AgentSpec> {
    match domain {
        "legal" => vec![
            AgentSpec::new(
                "researcher",
                "You are a senior legal researcher. Search the provided legal knowledge \
                 and return favorable and unfavorable precedents. Cite only what exists \
                 in the provided knowledge base.",
                ModelTier::Precise,
            )
            .expects_json(),
            AgentSpec::new(
                "auditor",
                "You are a senior regulatory auditor. Cross-check the contract against \
                 the provided regulatory knowledge and identify violations, rating each \
                 clause as compliant, non-compliant, or moderate risk.",
                ModelTier::Precise,
            )
            .expects_json(),
            AgentSpec::new(
                "drafter",
                "You are a senior legal drafter. Draft the requested legal text using \
                 the provided knowledge as the institutional standard, marking anything \
                 unverified for human review.",
                ModelTier::Precise,
            ),
            AgentSpec::new(
                "watcher",
                "You are a regulatory watcher. Assess the impact of the given \
                 regulatory publication on the contracts in the provided knowledge, \
                 rating severity as info, warning, or critical.",
                ModelTier::Fast,
            )
            .expects_json(),
        ],
        "ghost" => vec![AgentSpec::new(
            "ghostwriter",
            "You are a ghostwriter. Write in the voice captured by the provided style \
             references, preserving the author's tone and vocabulary.",
            ModelTier::Fast,
        )],
        "query" => vec![AgentSpec::new(
            "sql_translator",
            "You translate natural-language questions into SQL using the schema notes \
             and query examples in the provided knowledge. Return only verifiable \
             column and table names.",
            ModelTier::Fast,
        )
        .expects_json()],
        "insurance" => vec![
            AgentSpec::new(
                "claims_analyst",
                "You are an insurance claims analyst. Analyze loss ratios and claims \
                 patterns strictly from the provided policy and claims knowledge.",
                ModelTier::Precise,
            )
            .expects_json(),
            AgentSpec::new(
                "benefits_advisor",
                "You are a benefits advisor. Recommend coverage adjustments grounded \
                 in the provided policies and regulatory norms.",
                ModelTier::Precise,
            )
            .expects_json(),
        ],
        _ => Vec::new(),
    }
}
