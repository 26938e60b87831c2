//! Context bundles for agent execution.

use quorum_core::HubResult;
use quorum_llm::ChatMessage;
use serde_json::json;

use crate::prompts;

/// Everything an agent sees for one task.
///
/// All agents in a debate receive the identical bundle; only their role
/// instructions differ.
#[derive(Debug, Clone, Default)]
pub struct ContextBundle {
    /// Formatted knowledge block, empty when retrieval was skipped or
    /// returned nothing
    pub knowledge: String,

    /// The task input: a question, or a document under analysis
    pub input: String,

    /// Recent conversation history, oldest first
    pub history: Vec<ChatMessage>,
}

impl ContextBundle {
    /// Create a bundle without history.
    pub fn new(knowledge: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            knowledge: knowledge.into(),
            input: input.into(),
            history: Vec::new(),
        }
    }

    /// Attach conversation history.
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    /// Render the task prompt sent to each agent.
    pub fn task_prompt(&self) -> HubResult<String> {
        prompts::render(
            prompts::TASK_TEMPLATE,
            &json!({
                "knowledge": self.knowledge,
                "input": self.input,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_prompt_contains_input() {
        let bundle = ContextBundle::new("", "review the indemnity clause");
        let prompt = bundle.task_prompt().unwrap();
        assert!(prompt.contains("review the indemnity clause"));
    }

    #[test]
    fn test_task_prompt_leads_with_knowledge() {
        let bundle = ContextBundle::new("[KNOWLEDGE_BASE]\n[LAW] Code - text", "question");
        let prompt = bundle.task_prompt().unwrap();
        assert!(prompt.starts_with("[KNOWLEDGE_BASE]"));
    }
}
