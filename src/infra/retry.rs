//! Backoff policy and request pacing for endpoint failover.

use rand::Rng;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::domain::RpcFailure;

/// Decision for a failed call against one endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given delay, then retry the same endpoint
    Retry(Duration),
    /// Stop retrying this endpoint and fail over to the next one
    GiveUp,
}

/// Pure backoff/give-up policy.
///
/// Rate-limited calls retry the same endpoint with capped exponential backoff
/// plus uniform jitter; network errors and timeouts fail over immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Base delay for the exponential backoff curve
    pub base_delay: Duration,
    /// Cap applied to the exponential component
    pub max_delay: Duration,
    /// Uniform random jitter added on top of the capped delay
    pub jitter_window: Duration,
    /// Total calls allowed against one endpoint before failing over
    pub max_retries_per_endpoint: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter_window: Duration::from_millis(250),
            max_retries_per_endpoint: 3,
        }
    }
}

impl RetryPolicy {
    /// Decide what to do after attempt number `attempt` (zero-based) against
    /// the current endpoint failed with `failure`.
    #[must_use]
    pub fn decide(&self, attempt: u32, failure: &RpcFailure) -> RetryDecision {
        match failure {
            RpcFailure::RateLimited(_) => {
                if attempt + 1 >= self.max_retries_per_endpoint {
                    RetryDecision::GiveUp
                } else {
                    RetryDecision::Retry(self.backoff_delay(attempt))
                }
            }
            // No point hammering a node that refused the connection or
            // answered garbage; the next endpoint is the better bet.
            RpcFailure::Network(_) | RpcFailure::Timeout(_) => RetryDecision::GiveUp,
        }
    }

    /// Backoff delay for attempt `attempt`:
    /// `min(base_delay * 2^attempt, max_delay) + uniform(0, jitter_window)`.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let exponential_ms = (self.base_delay.as_millis() as u64)
            .saturating_mul(factor)
            .min(self.max_delay.as_millis() as u64);

        let jitter_ms = self.jitter_window.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };

        Duration::from_millis(exponential_ms.saturating_add(jitter))
    }
}

/// Enforces a minimum spacing before every outbound call, shared across all
/// endpoints and operations, so retries and failovers never burst.
pub struct RequestPacer {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestPacer {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Wait until at least `min_interval` has passed since the previous
    /// outbound call, then claim the next slot.
    pub async fn pace(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
