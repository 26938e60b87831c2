//! Scripted mock LLM provider.
//!
//! Replies are dequeued in order; an exhausted script returns a fixed
//! placeholder. Every call is recorded so tests can assert on the exact
//! instructions and prompts that reached the model.

use crate::client::{LlmClient, LlmStream};
use crate::types::{GenRequest, ModelTier};
use quorum_core::{HubError, HubResult};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A call observed by the mock.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub tier: ModelTier,
    pub system: String,
    pub prompt: String,
}

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Failure(String),
}

/// Mock LLM client for tests and offline development.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    script: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockLlmClient {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful text reply.
    pub fn enqueue_text(&self, text: impl Into<String>) {
        self.script
            .lock()
            .expect("mock script lock")
            .push_back(Reply::Text(text.into()));
    }

    /// Queue an invocation failure.
    pub fn enqueue_failure(&self, detail: impl Into<String>) {
        self.script
            .lock()
            .expect("mock script lock")
            .push_back(Reply::Failure(detail.into()));
    }

    /// Number of calls observed so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock calls lock").len()
    }

    /// Snapshot of observed calls.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("mock calls lock").clone()
    }

    fn next_reply(&self, request: &GenRequest) -> HubResult<String> {
        self.calls
            .lock()
            .expect("mock calls lock")
            .push(RecordedCall {
                tier: request.tier,
                system: request.system.clone(),
                prompt: request.prompt.clone(),
            });

        match self.script.lock().expect("mock script lock").pop_front() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Failure(detail)) => Err(HubError::Model(detail)),
            None => Ok("mock response".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenRequest) -> HubResult<String> {
        self.next_reply(request)
    }

    async fn stream(&self, request: &GenRequest) -> HubResult<LlmStream> {
        let reply = self.next_reply(request)?;
        Ok(Box::pin(futures::stream::iter(vec![Ok(reply)])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let mock = MockLlmClient::new();
        mock.enqueue_text("first");
        mock.enqueue_text("second");

        let req = GenRequest::new(ModelTier::Fast, "sys", "q");
        assert_eq!(mock.generate(&req).await.unwrap(), "first");
        assert_eq!(mock.generate(&req).await.unwrap(), "second");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let mock = MockLlmClient::new();
        mock.enqueue_failure("quota exhausted");

        let req = GenRequest::new(ModelTier::Precise, "sys", "q");
        match mock.generate(&req).await {
            Err(HubError::Model(detail)) => assert_eq!(detail, "quota exhausted"),
            other => panic!("Expected Model error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_records_calls() {
        let mock = MockLlmClient::new();
        mock.enqueue_text("ok");

        let req = GenRequest::new(ModelTier::Fast, "the system prompt", "the question");
        mock.generate(&req).await.unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].system, "the system prompt");
        assert_eq!(calls[0].prompt, "the question");
    }

    #[tokio::test]
    async fn test_stream_yields_single_fragment() {
        let mock = MockLlmClient::new();
        mock.enqueue_text("streamed");

        let req = GenRequest::new(ModelTier::Fast, "s", "q");
        let mut stream = mock.stream(&req).await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), "streamed");
        assert!(stream.next().await.is_none());
    }
}
