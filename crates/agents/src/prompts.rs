//! Prompt templates and rendering.
//!
//! Templates are rendered with Handlebars (HTML escaping disabled; these
//! are plain-text prompts, not markup).

use handlebars::Handlebars;
use quorum_core::{HubError, HubResult};

/// Task prompt wrapping the knowledge block and the task input.
pub const TASK_TEMPLATE: &str = "\
{{#if knowledge}}{{knowledge}}

{{/if}}[TASK]
{{input}}

Carry out the analysis according to your instructions.";

/// Intent-gate prompt asking for a structured retrieval decision.
pub const INTENT_TEMPLATE: &str = "\
Analyze this user question and decide whether the knowledge base must be searched.

RESPOND IN JSON: {\"needs_retrieval\": true/false, \"refined_query\": \"...\", \"reason\": \"...\"}

Rules:
- needs_retrieval=true -> factual question about documents, contracts, laws, data, policies
- needs_retrieval=false -> greeting, conversational follow-up, rephrasing request, generic opinion
- refined_query -> version optimized for semantic search (only if needs_retrieval=true, otherwise \"\")

Recent history:
{{history}}

Current question: {{question}}";

/// Synthesizer prompt merging the successful agents' outputs.
pub const SYNTHESIS_TEMPLATE: &str = "\
You are the Senior Synthesis Editor.

You received analyses from {{agent_count}} specialized agents about the same request.
Your task: SYNTHESIZE the perspectives into one unified, coherent answer.

RULES:
1. Combine insights without repeating information.
2. If agents CONFLICT, flag the conflict explicitly.
3. Prioritize factual data over opinion.
4. Preserve source citations when available.
5. Structure as: Executive Summary, Combined Analysis, Points of Attention.

AGENT ANALYSES:
{{agent_outputs}}

ORIGINAL REQUEST: {{query}}

Synthesize now.";

/// Standing instruction for conversation summarization.
pub const SUMMARY_INSTRUCTION: &str = "\
Summarize this conversation in 2-3 objective sentences: \
(1) what the user wants, (2) data already returned, (3) context. Be concise.";

/// Truncate to a character budget without splitting a code point.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Render a template with the given variables.
pub fn render(template: &str, variables: &serde_json::Value) -> HubResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| HubError::Other(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| HubError::Other(format!("Failed to render template: {}", e)))
}
