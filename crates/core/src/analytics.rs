//! Best-effort usage analytics.
//!
//! Analytics must never break the primary request: [`Analytics::record`]
//! catches sink failures at the boundary and logs them at warn.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::HubResult;

/// A single usage event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    /// Caller subject id
    pub subject_id: String,

    /// Knowledge domain the request targeted
    pub domain: String,

    /// Event kind, e.g. "agent_invoke", "ingest", "debate"
    pub event_type: String,

    /// Tokens consumed, when the provider reports them
    pub tokens_used: Option<u32>,

    /// Free-form metadata
    #[serde(default)]
    pub metadata: serde_json::Value,

    /// Event timestamp
    pub created_at: DateTime<Utc>,
}

impl UsageEvent {
    /// Create an event stamped with the current time.
    pub fn new(
        subject_id: impl Into<String>,
        domain: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            domain: domain.into(),
            event_type: event_type.into(),
            tokens_used: None,
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }
}

/// Trait for analytics event sinks.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn record(&self, event: &UsageEvent) -> HubResult<()>;
}

/// Sink that emits events as structured log lines.
#[derive(Debug, Default)]
pub struct TracingSink;

#[async_trait]
impl EventSink for TracingSink {
    async fn record(&self, event: &UsageEvent) -> HubResult<()> {
        tracing::info!(
            subject = %event.subject_id,
            domain = %event.domain,
            event = %event.event_type,
            tokens = ?event.tokens_used,
            "usage event"
        );
        Ok(())
    }
}

/// Sink that drops every event. Used in tests.
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl EventSink for NullSink {
    async fn record(&self, _event: &UsageEvent) -> HubResult<()> {
        Ok(())
    }
}

/// Best-effort analytics facade over an [`EventSink`].
#[derive(Clone)]
pub struct Analytics {
    sink: Arc<dyn EventSink>,
}

impl Analytics {
    /// Wrap a sink.
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Record an event, swallowing sink failures.
    pub async fn record(&self, event: UsageEvent) {
        if let Err(e) = self.sink.record(&event).await {
            tracing::warn!("Failed to record analytics event: {}", e);
        }
    }
}
