//! Pluggable per-caller rate limiting.
//!
//! Two interchangeable strategies, selected at startup from
//! configuration:
//! - [`LocalBucketLimiter`]: in-process token bucket, always available.
//! - [`SharedCounterLimiter`]: fixed window over an external shared
//!   counter (e.g. a Redis-style increment with expiry), for multi-node
//!   deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Instant;

use crate::config::RateLimitSettings;
use crate::error::{HubError, HubResult};

/// Trait for rate limiter strategies.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Charge `cost` against the caller's budget.
    ///
    /// Returns `HubError::RateLimited` with a retry hint when the budget
    /// is exhausted.
    async fn check(&self, key: &str, cost: f64) -> HubResult<()>;
}

/// External shared counter capability.
///
/// `increment` bumps the counter for `key`, setting it to expire after
/// `ttl_secs` if newly created, and returns the post-increment value.
#[async_trait]
pub trait SharedCounter: Send + Sync {
    async fn increment(&self, key: &str, ttl_secs: u64) -> HubResult<u64>;

    /// Seconds until the counter for `key` expires.
    async fn ttl(&self, key: &str) -> HubResult<u64>;
}

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// In-process token bucket limiter.
pub struct LocalBucketLimiter {
    max_tokens: f64,
    refill_per_sec: f64,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl LocalBucketLimiter {
    /// Create a limiter with the given bucket capacity and refill rate.
    pub fn new(max_tokens: f64, refill_per_sec: f64) -> Self {
        Self {
            max_tokens,
            refill_per_sec,
            buckets: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RateLimiter for LocalBucketLimiter {
    async fn check(&self, key: &str, cost: f64) -> HubResult<()> {
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| HubError::Other("Rate limiter lock poisoned".to_string()))?;

        let now = Instant::now();
        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: self.max_tokens,
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.max_tokens);
        bucket.last_refill = now;

        if bucket.tokens < cost {
            let retry_after = ((cost - bucket.tokens) / self.refill_per_sec).ceil() as u64 + 1;
            return Err(HubError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        bucket.tokens -= cost;
        Ok(())
    }
}

/// Fixed-window limiter over an external shared counter.
pub struct SharedCounterLimiter {
    counter: Arc<dyn SharedCounter>,
    window_secs: u64,
    max_per_window: u64,
}

impl SharedCounterLimiter {
    /// Create a limiter over the given counter capability.
    pub fn new(counter: Arc<dyn SharedCounter>, window_secs: u64, max_per_window: u64) -> Self {
        Self {
            counter,
            window_secs,
            max_per_window,
        }
    }
}

#[async_trait]
impl RateLimiter for SharedCounterLimiter {
    async fn check(&self, key: &str, cost: f64) -> HubResult<()> {
        let counter_key = format!("quorum:rate:{}", key);
        let current = self
            .counter
            .increment(&counter_key, self.window_secs)
            .await?;

        // Cost is rounded up: the shared counter tracks whole requests.
        let charged = cost.ceil().max(1.0) as u64;
        if current + charged - 1 > self.max_per_window {
            let retry_after = self.counter.ttl(&counter_key).await.unwrap_or(self.window_secs);
            return Err(HubError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        Ok(())
    }
}

/// Build a rate limiter from configuration.
///
/// The local bucket is the always-available fallback: it is used when the
/// strategy is "local", unknown, or when "shared" is requested without a
/// counter capability.
pub fn create_limiter(
    settings: &RateLimitSettings,
    counter: Option<Arc<dyn SharedCounter>>,
) -> Arc<dyn RateLimiter> {
    match (settings.strategy.as_str(), counter) {
        ("shared", Some(counter)) => {
            tracing::info!("Using shared-counter rate limiter");
            Arc::new(SharedCounterLimiter::new(
                counter,
                settings.window_secs,
                settings.max_per_window,
            ))
        }
        ("shared", None) => {
            tracing::warn!("Shared rate limiter requested but no counter available, using local bucket");
            Arc::new(LocalBucketLimiter::new(
                settings.bucket_capacity,
                settings.refill_per_sec,
            ))
        }
        (other, _) => {
            if other != "local" {
                tracing::warn!("Unknown rate limit strategy '{}', using local bucket", other);
            }
            Arc::new(LocalBucketLimiter::new(
                settings.bucket_capacity,
                settings.refill_per_sec,
            ))
        }
    }
}
