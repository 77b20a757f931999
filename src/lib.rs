//! Resilient Solana balance queries and transfers over untrusted JSON-RPC
//! endpoints.
//!
//! Public RPC nodes rate-limit, drop connections, and answer garbage. This
//! crate makes balance reads and one-shot transfer submissions reliable
//! anyway: an ordered endpoint pool with per-endpoint backoff and failover,
//! per-call failure classification, and a transaction lifecycle
//! (`build → fetch recency token → external signing → broadcast → confirm`)
//! with bounded restarts and an explicitly ambiguous confirmation-timeout
//! outcome.
//!
//! Signing is delegated to an injected [`domain::TransferSigner`]; prices to
//! an injected [`domain::PriceFeed`]. The engine owns neither.

pub mod app;
pub mod config;
pub mod domain;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use app::{BalanceQueryService, TransferConfig, TransferOrchestrator};
pub use config::EngineConfig;
pub use domain::{
    AppError, ConfirmationStatus, Endpoint, RecencyToken, RpcError, RpcFailure,
    SignedTransaction, TransferResult, TransferStatus, WalletBalance,
};
pub use infra::{EndpointPool, HttpRpcClient, KeypairSigner, RetryPolicy};
