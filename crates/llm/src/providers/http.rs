//! HTTP LLM provider for OpenAI-compatible chat endpoints.
//!
//! Works against any server exposing the `/chat/completions` contract
//! (hosted APIs, vLLM, llama.cpp server, ...).

use crate::client::{LlmClient, LlmStream};
use crate::types::{ChatRole, GenRequest, ModelTier};
use futures::StreamExt;
use quorum_core::config::LlmSettings;
use quorum_core::{HubError, HubResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Chat completion request wire format.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

/// Chat completion response wire format.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Streaming chunk wire format.
#[derive(Debug, Deserialize)]
struct ChatChunk {
    choices: Vec<DeltaChoice>,
}

#[derive(Debug, Deserialize)]
struct DeltaChoice {
    delta: Delta,
}

#[derive(Debug, Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP LLM client with model-tier routing.
pub struct HttpLlmClient {
    base_url: String,
    api_key: Option<String>,
    fast_model: String,
    precise_model: String,
    client: reqwest::Client,
}

impl HttpLlmClient {
    /// Create a client from LLM settings.
    pub fn new(settings: &LlmSettings, api_key: Option<String>) -> HubResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| HubError::Model(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            api_key,
            fast_model: settings.fast_model.clone(),
            precise_model: settings.precise_model.clone(),
            client,
        })
    }

    /// Resolve a model tier to the configured model identifier.
    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Precise => &self.precise_model,
        }
    }

    /// Convert a GenRequest to the wire format.
    fn to_wire(&self, request: &GenRequest, stream: bool) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.recent_history().len() + 2);

        messages.push(WireMessage {
            role: "system".to_string(),
            content: request.system.clone(),
        });

        for turn in request.recent_history() {
            let role = match turn.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            };
            messages.push(WireMessage {
                role: role.to_string(),
                content: turn.content.clone(),
            });
        }

        messages.push(WireMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        ChatRequest {
            model: self.model_for(request.tier).to_string(),
            messages,
            stream,
        }
    }

    fn build_post(&self, body: &ChatRequest) -> reqwest::RequestBuilder {
        let url = format!("{}/chat/completions", self.base_url);
        let mut builder = self.client.post(&url).json(body);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }
}

#[async_trait::async_trait]
impl LlmClient for HttpLlmClient {
    fn provider_name(&self) -> &str {
        "http"
    }

    async fn generate(&self, request: &GenRequest) -> HubResult<String> {
        tracing::debug!(tier = request.tier.as_str(), "Sending completion request");

        let wire = self.to_wire(request, false);
        let response = self
            .build_post(&wire)
            .send()
            .await
            .map_err(|e| HubError::Model(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(HubError::Model(format!(
                "LLM API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| HubError::Model(format!("Failed to parse response: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| HubError::Model("Response contained no choices".to_string()))?;

        Ok(choice.message.content)
    }

    async fn stream(&self, request: &GenRequest) -> HubResult<LlmStream> {
        tracing::debug!(tier = request.tier.as_str(), "Starting streaming request");

        let wire = self.to_wire(request, true);
        let response = self
            .build_post(&wire)
            .send()
            .await
            .map_err(|e| HubError::Model(format!("Failed to send streaming request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(HubError::Model(format!(
                "LLM API error ({}): {}",
                status, error_text
            )));
        }

        // Server-sent events: each line is `data: {json}` with a final
        // `data: [DONE]` sentinel.
        let stream = response.bytes_stream().map(|result| {
            let bytes = result.map_err(|e| HubError::Model(format!("Stream error: {}", e)))?;

            let text = String::from_utf8_lossy(&bytes);
            let fragments: Vec<HubResult<String>> = text
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(|payload| payload.trim())
                .filter(|payload| !payload.is_empty() && *payload != "[DONE]")
                .map(|payload| {
                    let chunk: ChatChunk = serde_json::from_str(payload)
                        .map_err(|e| HubError::Model(format!("Failed to parse chunk: {}", e)))?;

                    Ok(chunk
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content)
                        .unwrap_or_default())
                })
                .filter(|fragment| !matches!(fragment, Ok(content) if content.is_empty()))
                .collect();

            Ok(futures::stream::iter(fragments))
        });

        Ok(Box::pin(stream.flat_map(|result| match result {
            Ok(fragments) => fragments,
            Err(e) => futures::stream::iter(vec![Err(e)]),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;

    fn test_client() -> HttpLlmClient {
        let settings = LlmSettings {
            endpoint: "http://localhost:8000/v1/".to_string(),
            fast_model: "flash".to_string(),
            precise_model: "pro".to_string(),
            ..Default::default()
        };
        HttpLlmClient::new(&settings, None).unwrap()
    }

    #[test]
    fn test_tier_routing() {
        let client = test_client();
        assert_eq!(client.model_for(ModelTier::Fast), "flash");
        assert_eq!(client.model_for(ModelTier::Precise), "pro");
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let client = test_client();
        assert_eq!(client.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn test_wire_message_layout() {
        let client = test_client();
        let request = GenRequest::new(ModelTier::Precise, "system text", "the question")
            .with_history(vec![
                ChatMessage::user("earlier question"),
                ChatMessage::assistant("earlier answer"),
            ]);

        let wire = client.to_wire(&request, false);
        assert_eq!(wire.model, "pro");
        assert_eq!(wire.messages.len(), 4);
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(wire.messages[1].role, "user");
        assert_eq!(wire.messages[2].role, "assistant");
        assert_eq!(wire.messages[3].content, "the question");
    }

    #[test]
    fn test_history_capped_at_window() {
        let client = test_client();
        let history: Vec<ChatMessage> = (0..12)
            .map(|i| ChatMessage::user(format!("turn {}", i)))
            .collect();
        let request = GenRequest::new(ModelTier::Fast, "s", "q").with_history(history);

        let wire = client.to_wire(&request, false);
        // system + 6 capped turns + prompt
        assert_eq!(wire.messages.len(), 8);
    }
}
