//! Transfer lifecycle orchestration.
//!
//! Drives a single logical transfer through
//! `Built → RecencyFetched → Signed → Submitted → Confirmed | Failed`.
//! All network I/O goes through the endpoint pool; authorization goes through
//! the injected signer, exactly once per lifecycle round.

use solana_sdk::hash::Hash;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::Transaction;
use solana_system_interface::instruction as system_instruction;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::EngineConfig;
use crate::domain::{
    AppError, ConfirmationStatus, RpcError, TransferError, TransferPhase, TransferRequest,
    TransferResult, TransferSigner, TransferStatus, ValidationError,
};
use crate::infra::rpc::pool::EndpointPool;

use super::parse_address;

/// Tuning for the transfer lifecycle
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Lamports held back to cover transaction fees
    pub fee_reserve: u64,
    /// Overall deadline for confirmation polling
    pub confirmation_timeout: Duration,
    /// Interval between signature-status polls
    pub confirmation_poll_interval: Duration,
    /// Validity window of a fetched recency token
    pub recency_token_ttl: Duration,
    /// Restarts to the token fetch allowed when the token goes stale before
    /// a successful broadcast
    pub max_recency_refreshes: u32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            fee_reserve: 10_000_000,
            confirmation_timeout: Duration::from_secs(60),
            confirmation_poll_interval: Duration::from_millis(500),
            recency_token_ttl: Duration::from_secs(90),
            max_recency_refreshes: 1,
        }
    }
}

impl From<&EngineConfig> for TransferConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            fee_reserve: config.fee_reserve,
            confirmation_timeout: config.confirmation_timeout,
            confirmation_poll_interval: config.confirmation_poll_interval,
            recency_token_ttl: config.recency_token_ttl,
            max_recency_refreshes: config.max_recency_refreshes,
        }
    }
}

/// One-shot transfer state machine
pub struct TransferOrchestrator {
    pool: Arc<EndpointPool>,
    signer: Arc<dyn TransferSigner>,
    config: TransferConfig,
}

impl TransferOrchestrator {
    #[must_use]
    pub fn new(
        pool: Arc<EndpointPool>,
        signer: Arc<dyn TransferSigner>,
        config: TransferConfig,
    ) -> Self {
        Self {
            pool,
            signer,
            config,
        }
    }

    /// Transfer the sender's full balance minus the fee reserve to the
    /// recipient.
    ///
    /// Returns the broadcast signature with a `Confirmed` or `TimedOut`
    /// status; `TimedOut` is ambiguous — the transaction may still land.
    ///
    /// Every suspension point is a network call or a backoff sleep, so
    /// dropping this future (or racing it against a caller deadline)
    /// abandons any in-flight call immediately.
    #[instrument(skip(self))]
    pub async fn transfer(
        &self,
        sender: &str,
        recipient: &str,
    ) -> Result<TransferResult, AppError> {
        // Pre-flight: both addresses must be well-formed and the recipient
        // on-curve, before any network call
        let recipient_pubkey = validate_recipient(recipient)?;
        let sender_pubkey = parse_address(sender)?;

        let gross_balance = self
            .pool
            .execute("getBalance", move |client| async move {
                client.get_balance(&sender_pubkey).await
            })
            .await?;

        let request = TransferRequest::new(
            sender_pubkey,
            recipient_pubkey,
            gross_balance,
            self.config.fee_reserve,
        );
        let amount = request
            .transferable_amount()
            .ok_or(TransferError::InsufficientBalance {
                gross: gross_balance,
                fee_reserve: self.config.fee_reserve,
            })?;

        let instruction = system_instruction::transfer(&sender_pubkey, &recipient_pubkey, amount);
        debug!(phase = ?TransferPhase::Built, amount, "Transfer instruction built");

        let mut refreshes: u32 = 0;
        let signature = loop {
            let token = self
                .pool
                .execute("getLatestBlockhash", |client| async move {
                    client.get_recency_token().await
                })
                .await?;
            debug!(phase = ?TransferPhase::RecencyFetched, token = %token.token, "Recency token attached");

            let blockhash = token
                .token
                .parse::<Hash>()
                .map_err(|e| RpcError::MalformedRecencyToken(e.to_string()))?;

            let message = Message::new(&[instruction.clone()], Some(&sender_pubkey));
            let mut unsigned = Transaction::new_unsigned(message);
            unsigned.message.recent_blockhash = blockhash;

            // Signing is user-authorized and happens exactly once per round;
            // a rejection is terminal
            let signed = self
                .signer
                .sign_transaction(unsigned)
                .await
                .map_err(|rejection| TransferError::SigningRejected(rejection.reason))?;
            debug!(phase = ?TransferPhase::Signed, "Transaction signed");

            // The token can go stale while the user deliberates; a stale
            // instruction must reference a fresh token and be re-signed
            if token.is_expired(self.config.recency_token_ttl) {
                if refreshes >= self.config.max_recency_refreshes {
                    warn!(phase = ?TransferPhase::Failed, refreshes, "Recency token refresh budget spent");
                    return Err(TransferError::RecencyTokenExpired { refreshes }.into());
                }
                refreshes += 1;
                info!(refreshes, "Recency token expired before broadcast; refetching");
                continue;
            }

            let broadcast = {
                let tx = signed.clone();
                self.pool
                    .execute("sendTransaction", move |client| {
                        let tx = tx.clone();
                        async move { client.send_transaction(&tx).await }
                    })
                    .await
            };

            match broadcast {
                Ok(signature) => break signature,
                Err(e) => {
                    if token.is_expired(self.config.recency_token_ttl)
                        && refreshes < self.config.max_recency_refreshes
                    {
                        refreshes += 1;
                        warn!(error = %e, refreshes, "Broadcast failed on a stale token; refetching");
                        continue;
                    }
                    return Err(e.into());
                }
            }
        };
        info!(phase = ?TransferPhase::Submitted, signature = %signature, "Transaction broadcast");

        let status = match tokio::time::timeout(
            self.config.confirmation_timeout,
            self.poll_confirmation(&signature),
        )
        .await
        {
            Ok(Ok(())) => {
                info!(phase = ?TransferPhase::Confirmed, signature = %signature, "Transfer confirmed");
                TransferStatus::Confirmed
            }
            Ok(Err(e)) => {
                warn!(phase = ?TransferPhase::Failed, signature = %signature, error = %e, "Transfer failed on ledger");
                return Err(e.into());
            }
            Err(_) => {
                // Ambiguous by design: the transaction was broadcast and may
                // or may not have landed
                warn!(signature = %signature, "Confirmation deadline expired");
                TransferStatus::TimedOut
            }
        };

        Ok(TransferResult { signature, status })
    }

    /// Poll signature status until confirmed or the ledger reports an
    /// execution error. Transient poll failures are retried until the
    /// caller's overall deadline cancels this future.
    async fn poll_confirmation(&self, signature: &str) -> Result<(), TransferError> {
        loop {
            let sig = signature.to_string();
            let poll = self
                .pool
                .execute("getSignatureStatuses", move |client| {
                    let sig = sig.clone();
                    async move { client.get_signature_status(&sig).await }
                })
                .await;

            match poll {
                Ok(ConfirmationStatus::Confirmed) => return Ok(()),
                Ok(ConfirmationStatus::Pending) => {
                    debug!(signature, "Transaction not yet confirmed");
                }
                Ok(ConfirmationStatus::Failed(reason)) => {
                    return Err(TransferError::TransactionFailed(reason));
                }
                Err(e) => {
                    warn!(signature, error = %e, "Status poll failed; retrying until deadline");
                }
            }
            tokio::time::sleep(self.config.confirmation_poll_interval).await;
        }
    }
}

/// Recipient addresses must be well-formed base58 and on the ed25519 curve.
fn validate_recipient(address: &str) -> Result<Pubkey, ValidationError> {
    let pubkey = parse_address(address)?;
    if !pubkey.is_on_curve() {
        return Err(ValidationError::InvalidAddress {
            address: address.to_string(),
            reason: "address is not on the ed25519 curve".to_string(),
        });
    }
    Ok(pubkey)
}
