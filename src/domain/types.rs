//! Core domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;

/// Lamports per SOL (1 SOL = 1_000_000_000 lamports)
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// One upstream RPC node. Endpoints are configured at startup and tried in
/// list order; the list is never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// HTTP(S) address of the node's JSON-RPC interface
    pub address: String,
}

impl Endpoint {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// A short-lived freshness proof (the ledger's latest blockhash) that a
/// transaction must reference. Stale tokens force a re-fetch and re-sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecencyToken {
    /// Base58 blockhash string
    pub token: String,
    /// When this token was fetched from an endpoint
    pub fetched_at: DateTime<Utc>,
}

impl RecencyToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            fetched_at: Utc::now(),
        }
    }

    /// Construct with an explicit fetch time (useful for tests)
    #[must_use]
    pub fn with_fetched_at(token: impl Into<String>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            fetched_at,
        }
    }

    /// True once the token has outlived its validity window.
    #[must_use]
    pub fn is_expired(&self, validity_window: Duration) -> bool {
        let window = chrono::Duration::from_std(validity_window).unwrap_or(chrono::Duration::MAX);
        Utc::now() - self.fetched_at >= window
    }
}

/// A single logical transfer: drain the sender's balance minus a fee reserve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub sender: Pubkey,
    pub recipient: Pubkey,
    /// Sender's full balance in lamports, fetched at the start of the attempt
    pub gross_balance: u64,
    /// Lamports held back to cover transaction fees
    pub fee_reserve: u64,
}

impl TransferRequest {
    #[must_use]
    pub fn new(sender: Pubkey, recipient: Pubkey, gross_balance: u64, fee_reserve: u64) -> Self {
        Self {
            sender,
            recipient,
            gross_balance,
            fee_reserve,
        }
    }

    /// Amount actually moved: `gross_balance - fee_reserve`, only when
    /// strictly positive.
    #[must_use]
    pub fn transferable_amount(&self) -> Option<u64> {
        self.gross_balance
            .checked_sub(self.fee_reserve)
            .filter(|amount| *amount > 0)
    }
}

/// Opaque signed transaction bytes produced by the external signer.
///
/// Immutable once produced; safe to rebroadcast across endpoints while its
/// recency token is fresh because the ledger deduplicates by signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction(Vec<u8>);

impl SignedTransaction {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Result of one signature-status poll against an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Observed at the requested commitment level (confirmed or finalized)
    Confirmed,
    /// Not yet visible at the requested commitment level
    Pending,
    /// The ledger recorded the transaction with an execution error
    Failed(String),
}

/// Terminal status of a transfer attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Confirmation observed before the deadline
    Confirmed,
    /// Deadline expired without observing confirmation. Ambiguous: the
    /// transaction was broadcast and may still land.
    TimedOut,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::TimedOut => "timed_out",
        }
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a completed transfer attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    /// Base58 transaction signature returned at broadcast
    pub signature: String,
    pub status: TransferStatus,
}

/// A fetched account balance with its converted display values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalance {
    /// Base58 account address the balance belongs to
    pub address: String,
    /// Raw balance in lamports
    pub lamports: u64,
    /// Balance in SOL
    pub sol_balance: f64,
    /// Balance converted with the externally supplied price
    pub display_value: f64,
}

/// Lifecycle phase of a transfer attempt, logged at each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    Built,
    RecencyFetched,
    Signed,
    Submitted,
    Confirmed,
    Failed,
}

/// Convert lamports to SOL
#[must_use]
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}
