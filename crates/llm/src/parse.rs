//! Permissive parsing of model output.
//!
//! Models wrap JSON in markdown fences more often than not. Parsing here
//! strips the fences and attempts a decode; on failure the raw text is
//! preserved in a tagged fallback variant so downstream code must handle
//! the degraded case explicitly instead of assuming a shape.

use serde::{Deserialize, Serialize};

/// Result of parsing a model's text output as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ModelOutput {
    /// The output decoded as JSON
    Parsed(serde_json::Value),

    /// The output could not be decoded; raw text preserved
    Unparsed(String),
}

impl ModelOutput {
    /// The decoded JSON value, if parsing succeeded.
    pub fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Parsed(value) => Some(value),
            Self::Unparsed(_) => None,
        }
    }

    /// Whether the output decoded as JSON.
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    /// Render the output as display text.
    ///
    /// Parsed values serialize back to JSON; unparsed output is returned
    /// as-is.
    pub fn display_text(&self) -> String {
        match self {
            Self::Parsed(value) => value.to_string(),
            Self::Unparsed(raw) => raw.clone(),
        }
    }
}

/// Parse model output as JSON, stripping markdown fences if present.
///
/// Never fails: undecodable text comes back as
/// [`ModelOutput::Unparsed`].
pub fn parse_model_output(text: &str) -> ModelOutput {
    let stripped = strip_code_fences(text);

    match serde_json::from_str::<serde_json::Value>(stripped.trim()) {
        Ok(value) => ModelOutput::Parsed(value),
        Err(_) => ModelOutput::Unparsed(text.trim().to_string()),
    }
}

/// Strip a leading markdown code fence (with optional `json` tag) and its
/// closing fence.
fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    // Content between the first fence pair
    let mut inner = trimmed.split("```").nth(1).unwrap_or(trimmed);
    if let Some(rest) = inner.strip_prefix("json") {
        inner = rest;
    }
    inner.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_json() {
        let output = parse_model_output(r#"{"needs_rag": true}"#);
        assert_eq!(output.as_value().unwrap()["needs_rag"], json!(true));
    }

    #[test]
    fn test_parse_fenced_json() {
        let output = parse_model_output("```json\n{\"a\": 1}\n```");
        assert_eq!(output.as_value().unwrap()["a"], json!(1));
    }

    #[test]
    fn test_parse_fenced_without_tag() {
        let output = parse_model_output("```\n{\"a\": 2}\n```");
        assert_eq!(output.as_value().unwrap()["a"], json!(2));
    }

    #[test]
    fn test_parse_failure_preserves_raw() {
        let output = parse_model_output("I cannot answer that as JSON.");
        assert!(!output.is_parsed());
        assert_eq!(
            output.display_text(),
            "I cannot answer that as JSON."
        );
    }

    #[test]
    fn test_parse_garbage_in_fences() {
        let output = parse_model_output("```json\nnot json at all\n```");
        assert!(matches!(output, ModelOutput::Unparsed(_)));
    }
}
