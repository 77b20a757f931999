//! Error definitions for the transfer engine.
//!
//! Transient transport failures (`RpcFailure`) are classified per call and
//! consumed internally by the endpoint pool; everything surfaced to callers
//! carries a specific kind so they can render an accurate message.

use thiserror::Error;

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Classification of a single failed RPC call against one endpoint.
///
/// Exactly one classification per failure:
/// - `RateLimited`: the endpoint asked us to slow down (HTTP 429) — retry the
///   same endpoint after backoff.
/// - `Network`: connection refused, non-2xx status, malformed response, or a
///   JSON-RPC error object — fail over to the next endpoint immediately.
/// - `Timeout`: the per-request deadline elapsed — fail over immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcFailure {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),
}

/// Errors surfaced by the RPC layer
#[derive(Debug, Error)]
pub enum RpcError {
    /// Every configured endpoint was tried and failed within policy bounds.
    #[error("all {endpoints} endpoints exhausted after {attempts} attempts: {last}")]
    AllEndpointsExhausted {
        endpoints: usize,
        attempts: u32,
        last: RpcFailure,
    },

    /// An endpoint returned a recency token that does not parse as a
    /// blockhash.
    #[error("malformed recency token: {0}")]
    MalformedRecencyToken(String),
}

/// Pre-flight and lifecycle errors for a transfer attempt
#[derive(Debug, Error)]
pub enum TransferError {
    /// The gross balance does not cover the fee reserve.
    #[error("insufficient balance: {gross} lamports held, {fee_reserve} reserved for fees")]
    InsufficientBalance { gross: u64, fee_reserve: u64 },

    /// The external signer declined to authorize the transaction. Terminal;
    /// never retried.
    #[error("signing rejected: {0}")]
    SigningRejected(String),

    /// The recency token went stale before broadcast succeeded and the
    /// refresh budget is spent.
    #[error("recency token expired after {refreshes} refresh(es) without a successful broadcast")]
    RecencyTokenExpired { refreshes: u32 },

    /// The ledger recorded the transaction with an execution error.
    #[error("transaction failed on ledger: {0}")]
    TransactionFailed(String),
}

/// Input validation errors raised before any network call
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no RPC endpoints configured")]
    NoEndpoints,

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("invalid signing key: {0}")]
    InvalidSigningKey(String),
}

/// Rejection returned by an external signer collaborator.
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct SignerRejection {
    pub reason: String,
}

impl SignerRejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
