//! Mock implementations for testing.

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::Transaction;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::domain::{
    ConfirmationStatus, Endpoint, NodeClient, RecencyToken, RpcFailure, SignedTransaction,
    SignerRejection, TransferSigner,
};

/// A well-formed blockhash for default mock recency tokens
pub const MOCK_BLOCKHASH: &str = "GHtXQBsoZHVnNFa9YevAzFr17DJjgHXk3ycTy5nRhVT3";

/// Scripted mock node client with a recorded call log.
///
/// Each primitive pops a scripted outcome first; with no script the mock
/// returns a configured default (or a configured failure for every call).
pub struct MockNodeClient {
    endpoint: Endpoint,
    balances: Mutex<VecDeque<Result<u64, RpcFailure>>>,
    tokens: Mutex<VecDeque<Result<RecencyToken, RpcFailure>>>,
    broadcasts: Mutex<VecDeque<Result<String, RpcFailure>>>,
    statuses: Mutex<VecDeque<Result<ConfirmationStatus, RpcFailure>>>,
    default_balance: u64,
    default_status: ConfirmationStatus,
    default_failure: Option<RpcFailure>,
    calls: Mutex<Vec<&'static str>>,
}

impl MockNodeClient {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::new(format!("http://{}.mock", name.into())),
            balances: Mutex::new(VecDeque::new()),
            tokens: Mutex::new(VecDeque::new()),
            broadcasts: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(VecDeque::new()),
            default_balance: 0,
            default_status: ConfirmationStatus::Confirmed,
            default_failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Default balance returned when no scripted outcome is queued
    #[must_use]
    pub fn with_balance(mut self, lamports: u64) -> Self {
        self.default_balance = lamports;
        self
    }

    /// Default confirmation status returned when no scripted outcome is
    /// queued
    #[must_use]
    pub fn with_status(mut self, status: ConfirmationStatus) -> Self {
        self.default_status = status;
        self
    }

    /// Make every unscripted call fail with the given classification
    #[must_use]
    pub fn failing_with(mut self, failure: RpcFailure) -> Self {
        self.default_failure = Some(failure);
        self
    }

    pub fn push_balance(&self, outcome: Result<u64, RpcFailure>) {
        self.balances.lock().unwrap().push_back(outcome);
    }

    pub fn push_token(&self, outcome: Result<RecencyToken, RpcFailure>) {
        self.tokens.lock().unwrap().push_back(outcome);
    }

    pub fn push_broadcast(&self, outcome: Result<String, RpcFailure>) {
        self.broadcasts.lock().unwrap().push_back(outcome);
    }

    pub fn push_status(&self, outcome: Result<ConfirmationStatus, RpcFailure>) {
        self.statuses.lock().unwrap().push_back(outcome);
    }

    /// Methods invoked, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls to one method
    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|m| **m == method)
            .count()
    }

    fn record(&self, method: &'static str) {
        self.calls.lock().unwrap().push(method);
    }

    fn unscripted<T>(&self, default: T) -> Result<T, RpcFailure> {
        match &self.default_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(default),
        }
    }
}

#[async_trait]
impl NodeClient for MockNodeClient {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn get_balance(&self, _address: &Pubkey) -> Result<u64, RpcFailure> {
        self.record("getBalance");
        if let Some(outcome) = self.balances.lock().unwrap().pop_front() {
            return outcome;
        }
        self.unscripted(self.default_balance)
    }

    async fn get_recency_token(&self) -> Result<RecencyToken, RpcFailure> {
        self.record("getLatestBlockhash");
        if let Some(outcome) = self.tokens.lock().unwrap().pop_front() {
            return outcome;
        }
        self.unscripted(RecencyToken::new(MOCK_BLOCKHASH))
    }

    async fn send_transaction(
        &self,
        _transaction: &SignedTransaction,
    ) -> Result<String, RpcFailure> {
        self.record("sendTransaction");
        if let Some(outcome) = self.broadcasts.lock().unwrap().pop_front() {
            return outcome;
        }
        self.unscripted("mock-signature".to_string())
    }

    async fn get_signature_status(
        &self,
        _signature: &str,
    ) -> Result<ConfirmationStatus, RpcFailure> {
        self.record("getSignatureStatuses");
        if let Some(outcome) = self.statuses.lock().unwrap().pop_front() {
            return outcome;
        }
        self.unscripted(self.default_status.clone())
    }
}

/// Mock signer that approves (or always rejects) and counts invocations.
pub struct MockSigner {
    reject_with: Option<String>,
    calls: AtomicU32,
}

impl MockSigner {
    #[must_use]
    pub fn approving() -> Self {
        Self {
            reject_with: None,
            calls: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            reject_with: Some(reason.into()),
            calls: AtomicU32::new(0),
        }
    }

    /// Number of signing requests received
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TransferSigner for MockSigner {
    async fn sign_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<SignedTransaction, SignerRejection> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(reason) = &self.reject_with {
            return Err(SignerRejection::new(reason.clone()));
        }
        let bytes = bincode::serialize(&transaction)
            .map_err(|e| SignerRejection::new(format!("serialization failed: {}", e)))?;
        Ok(SignedTransaction::new(bytes))
    }
}
