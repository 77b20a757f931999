//! Domain traits defining contracts for external systems.

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::Transaction;

use super::error::{RpcFailure, SignerRejection};
use super::types::{ConfirmationStatus, Endpoint, RecencyToken, SignedTransaction};

/// One upstream node's RPC primitives.
///
/// Implemented over HTTP for real endpoints; mock implementations drive the
/// failover tests. Each call classifies its own failure into exactly one
/// [`RpcFailure`].
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// The endpoint this client is bound to
    fn endpoint(&self) -> &Endpoint;

    /// Fetch an account balance in lamports
    async fn get_balance(&self, address: &Pubkey) -> Result<u64, RpcFailure>;

    /// Fetch a fresh recency token (latest blockhash)
    async fn get_recency_token(&self) -> Result<RecencyToken, RpcFailure>;

    /// Broadcast already-signed transaction bytes; returns the signature
    async fn send_transaction(&self, transaction: &SignedTransaction)
    -> Result<String, RpcFailure>;

    /// Check a signature's confirmation status once
    async fn get_signature_status(&self, signature: &str)
    -> Result<ConfirmationStatus, RpcFailure>;
}

/// External signing authority (wallet collaborator).
///
/// Called exactly once per transfer lifecycle round; a rejection is terminal
/// and never retried.
#[async_trait]
pub trait TransferSigner: Send + Sync {
    /// Authorize and sign a built transaction, returning opaque wire bytes
    async fn sign_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<SignedTransaction, SignerRejection>;
}

/// External price feed collaborator. The engine neither fetches nor caches
/// prices itself.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Current price of one SOL in the display currency
    async fn current_price(&self) -> f64;
}

/// Fixed-price feed, the documented fallback when no live feed is wired in.
pub struct StaticPriceFeed {
    price: f64,
}

impl StaticPriceFeed {
    #[must_use]
    pub fn new(price: f64) -> Self {
        Self { price }
    }
}

#[async_trait]
impl PriceFeed for StaticPriceFeed {
    async fn current_price(&self) -> f64 {
        self.price
    }
}
