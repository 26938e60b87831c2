//! Global anti-hallucination guardrail.
//!
//! Every model invocation in the hub receives its system instructions
//! through [`compose`]; there is no code path that bypasses it.

/// Fixed policy text prepended to every agent's instructions.
pub const GLOBAL_GUARDRAIL: &str = "\
[NON-NEGOTIABLE RULES — QUORUM PLATFORM]
1. NEVER fabricate factual data (numbers, dates, names, citations, legal provisions, monetary amounts).
2. If the information is not present in the provided knowledge base, state EXPLICITLY that it was not found.
3. Distinguish FACTS (extracted from the knowledge base) from ANALYSIS (your own conclusions).
4. If asked for an action outside your scope, reply: \"That is outside my scope as [your role].\"";

/// Compose effective system instructions for a model invocation.
///
/// The guardrail always comes first; module-specific instructions follow.
/// An empty module prompt yields the guardrail alone.
pub fn compose(module_prompt: &str) -> String {
    if module_prompt.is_empty() {
        GLOBAL_GUARDRAIL.to_string()
    } else {
        format!("{}\n{}", GLOBAL_GUARDRAIL, module_prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guardrail_is_substantive() {
        assert!(GLOBAL_GUARDRAIL.len() > 100);
        assert!(GLOBAL_GUARDRAIL.contains("NEVER fabricate"));
    }

    #[test]
    fn test_compose_prefixes_guardrail() {
        let composed = compose("You are a legal auditor.");
        assert!(composed.starts_with(GLOBAL_GUARDRAIL));
        assert!(composed.ends_with("You are a legal auditor."));
    }

    #[test]
    fn test_compose_empty_prompt() {
        assert_eq!(compose(""), GLOBAL_GUARDRAIL);
    }

    #[test]
    fn test_compose_prefix_holds_for_varied_inputs() {
        for prompt in ["", "x", "multi\nline\ninstructions", "[PERSONA] auditor"] {
            assert!(compose(prompt).starts_with(GLOBAL_GUARDRAIL));
        }
    }
}
