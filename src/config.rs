//! Engine configuration.
//!
//! All tuning constants live here, constructed once and shared read-only.
//! `from_env` reads the process environment (pair with `dotenvy` at the
//! binary edge); defaults below are the documented fallbacks.

use solana_commitment_config::CommitmentConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::{ConfigError, Endpoint};
use crate::infra::retry::RetryPolicy;

/// Immutable configuration for the transfer engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// RPC endpoints in priority order
    pub endpoints: Vec<Endpoint>,
    /// Base delay for rate-limit backoff
    pub base_delay: Duration,
    /// Cap on the exponential backoff component
    pub max_delay: Duration,
    /// Uniform jitter added to each backoff delay
    pub jitter_window: Duration,
    /// Minimum spacing enforced before every outbound call
    pub min_request_interval: Duration,
    /// Total calls allowed against one endpoint per operation
    pub max_retries_per_endpoint: u32,
    /// Per-request deadline for each RPC call
    pub request_timeout: Duration,
    /// Commitment level for reads, preflight, and status polls
    pub commitment: CommitmentConfig,
    /// Overall deadline for confirmation polling
    pub confirmation_timeout: Duration,
    /// Interval between signature-status polls
    pub confirmation_poll_interval: Duration,
    /// Lamports held back from a transfer to cover fees
    pub fee_reserve: u64,
    /// Validity window of a fetched recency token
    pub recency_token_ttl: Duration,
    /// Restarts to the token fetch allowed when the token expires before a
    /// successful broadcast
    pub max_recency_refreshes: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter_window: Duration::from_millis(250),
            min_request_interval: Duration::from_millis(100),
            max_retries_per_endpoint: 3,
            request_timeout: Duration::from_secs(30),
            commitment: CommitmentConfig::confirmed(),
            confirmation_timeout: Duration::from_secs(60),
            confirmation_poll_interval: Duration::from_millis(500),
            fee_reserve: 10_000_000,
            recency_token_ttl: Duration::from_secs(90),
            max_recency_refreshes: 1,
        }
    }
}

impl EngineConfig {
    /// Load from the process environment. `RPC_ENDPOINTS` (comma-separated)
    /// is required; everything else falls back to the defaults above.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let endpoints: Vec<Endpoint> = lookup("RPC_ENDPOINTS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Endpoint::new)
            .collect();
        if endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }

        let commitment = match lookup("COMMITMENT").as_deref() {
            None | Some("") => defaults.commitment,
            Some("processed") => CommitmentConfig::processed(),
            Some("confirmed") => CommitmentConfig::confirmed(),
            Some("finalized") => CommitmentConfig::finalized(),
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "COMMITMENT".to_string(),
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            endpoints,
            base_delay: Duration::from_millis(parse_or(
                &lookup,
                "RETRY_BASE_DELAY_MS",
                defaults.base_delay.as_millis() as u64,
            )?),
            max_delay: Duration::from_millis(parse_or(
                &lookup,
                "RETRY_MAX_DELAY_MS",
                defaults.max_delay.as_millis() as u64,
            )?),
            jitter_window: Duration::from_millis(parse_or(
                &lookup,
                "RETRY_JITTER_MS",
                defaults.jitter_window.as_millis() as u64,
            )?),
            min_request_interval: Duration::from_millis(parse_or(
                &lookup,
                "MIN_REQUEST_INTERVAL_MS",
                defaults.min_request_interval.as_millis() as u64,
            )?),
            max_retries_per_endpoint: parse_or(
                &lookup,
                "MAX_RETRIES_PER_ENDPOINT",
                defaults.max_retries_per_endpoint,
            )?,
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "RPC_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            commitment,
            confirmation_timeout: Duration::from_secs(parse_or(
                &lookup,
                "CONFIRMATION_TIMEOUT_SECS",
                defaults.confirmation_timeout.as_secs(),
            )?),
            confirmation_poll_interval: Duration::from_millis(parse_or(
                &lookup,
                "CONFIRMATION_POLL_INTERVAL_MS",
                defaults.confirmation_poll_interval.as_millis() as u64,
            )?),
            fee_reserve: parse_or(&lookup, "FEE_RESERVE_LAMPORTS", defaults.fee_reserve)?,
            recency_token_ttl: Duration::from_secs(parse_or(
                &lookup,
                "RECENCY_TOKEN_TTL_SECS",
                defaults.recency_token_ttl.as_secs(),
            )?),
            max_recency_refreshes: parse_or(
                &lookup,
                "MAX_RECENCY_REFRESHES",
                defaults.max_recency_refreshes,
            )?,
        })
    }

    /// Retry policy view of this configuration
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: self.base_delay,
            max_delay: self.max_delay,
            jitter_window: self.jitter_window,
            max_retries_per_endpoint: self.max_retries_per_endpoint,
        }
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.is_empty() => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}
