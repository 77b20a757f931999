//! HTTP JSON-RPC client for a single upstream endpoint.
//!
//! One [`HttpRpcClient`] wraps exactly one [`Endpoint`] and exposes the four
//! primitives the engine needs. Every failed call is classified into exactly
//! one [`RpcFailure`] so the pool can decide between backoff and failover.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use solana_commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::{hash::Hash, pubkey::Pubkey};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::domain::{
    ConfigError, ConfirmationStatus, Endpoint, NodeClient, RecencyToken, RpcFailure,
    SignedTransaction,
};

/// Configuration for a per-endpoint client
#[derive(Debug, Clone)]
pub struct RpcClientConfig {
    /// Deadline applied independently to each outbound request
    pub request_timeout: Duration,
    /// Commitment level attached to reads, preflight, and status polls
    pub commitment: CommitmentConfig,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            commitment: CommitmentConfig::confirmed(),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<T: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: String,
    params: T,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// `{ "context": .., "value": .. }` wrapper used by account-scoped methods
#[derive(Debug, Deserialize)]
struct RpcValueResult<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct LatestBlockhashValue {
    blockhash: String,
}

#[derive(Debug, Deserialize)]
struct SignatureStatus {
    err: Option<serde_json::Value>,
    #[serde(rename = "confirmationStatus")]
    confirmation_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignatureStatusResult {
    value: Vec<Option<SignatureStatus>>,
}

/// JSON-RPC client bound to one endpoint
pub struct HttpRpcClient {
    endpoint: Endpoint,
    http_client: Client,
    config: RpcClientConfig,
}

impl HttpRpcClient {
    pub fn new(endpoint: Endpoint, config: RpcClientConfig) -> Result<Self, ConfigError> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            endpoint,
            http_client,
            config,
        })
    }

    fn commitment_str(&self) -> &'static str {
        match self.config.commitment.commitment {
            CommitmentLevel::Processed => "processed",
            CommitmentLevel::Confirmed => "confirmed",
            CommitmentLevel::Finalized => "finalized",
        }
    }

    /// Send one JSON-RPC request and classify any failure.
    async fn send_request<R: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<R, RpcFailure> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: method.to_string(),
            params,
        };

        let response = self
            .http_client
            .post(&self.endpoint.address)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RpcFailure::Timeout(e.to_string())
                } else {
                    RpcFailure::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RpcFailure::RateLimited(format!(
                "{} returned HTTP 429",
                self.endpoint
            )));
        }
        if !status.is_success() {
            return Err(RpcFailure::Network(format!(
                "{} returned HTTP {}",
                self.endpoint, status
            )));
        }

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| RpcFailure::Network(format!("malformed response: {}", e)))?;

        if let Some(error) = rpc_response.error {
            // A few providers signal rate limiting inside the JSON-RPC error
            // instead of the HTTP status
            let message = error.message.to_lowercase();
            if message.contains("rate limit") || message.contains("too many requests") {
                return Err(RpcFailure::RateLimited(format!(
                    "{}: {}",
                    error.code, error.message
                )));
            }
            return Err(RpcFailure::Network(format!(
                "{}: {}",
                error.code, error.message
            )));
        }

        rpc_response
            .result
            .ok_or_else(|| RpcFailure::Network("empty response".to_string()))
    }
}

#[async_trait]
impl NodeClient for HttpRpcClient {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn get_balance(&self, address: &Pubkey) -> Result<u64, RpcFailure> {
        let params = serde_json::json!([
            address.to_string(),
            { "commitment": self.commitment_str() }
        ]);
        let result: RpcValueResult<u64> = self.send_request("getBalance", params).await?;
        debug!(lamports = result.value, "Fetched balance");
        Ok(result.value)
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn get_recency_token(&self) -> Result<RecencyToken, RpcFailure> {
        let params = serde_json::json!([{ "commitment": self.commitment_str() }]);
        let result: RpcValueResult<LatestBlockhashValue> =
            self.send_request("getLatestBlockhash", params).await?;

        // A blockhash that does not parse means the node answered garbage
        result
            .value
            .blockhash
            .parse::<Hash>()
            .map_err(|e| RpcFailure::Network(format!("malformed blockhash: {}", e)))?;

        Ok(RecencyToken::new(result.value.blockhash))
    }

    #[instrument(skip(self, transaction), fields(endpoint = %self.endpoint))]
    async fn send_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> Result<String, RpcFailure> {
        let encoded = BASE64.encode(transaction.as_bytes());
        let params = serde_json::json!([
            encoded,
            {
                "encoding": "base64",
                "skipPreflight": false,
                "preflightCommitment": self.commitment_str()
            }
        ]);
        let signature: String = self.send_request("sendTransaction", params).await?;
        debug!(signature = %signature, "Transaction broadcast accepted");
        Ok(signature)
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn get_signature_status(
        &self,
        signature: &str,
    ) -> Result<ConfirmationStatus, RpcFailure> {
        let params = serde_json::json!([[signature], { "searchTransactionHistory": true }]);
        let result: SignatureStatusResult =
            self.send_request("getSignatureStatuses", params).await?;

        match result.value.first() {
            Some(Some(status)) => {
                if let Some(err) = &status.err {
                    return Ok(ConfirmationStatus::Failed(err.to_string()));
                }
                let confirmed = status.confirmation_status.as_deref() == Some("confirmed")
                    || status.confirmation_status.as_deref() == Some("finalized");
                if confirmed {
                    Ok(ConfirmationStatus::Confirmed)
                } else {
                    Ok(ConfirmationStatus::Pending)
                }
            }
            _ => Ok(ConfirmationStatus::Pending),
        }
    }
}
