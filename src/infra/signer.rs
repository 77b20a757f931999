//! Keypair-backed reference implementation of the signer collaborator.
//!
//! Production deployments inject a wallet-backed [`TransferSigner`]; this
//! implementation signs locally with an in-memory keypair and is used by
//! tests and operational tooling.

use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use secrecy::{ExposeSecret, SecretString};
use solana_sdk::signer::Signer as SolanaSigner;
use solana_sdk::signer::keypair::Keypair;
use solana_sdk::{pubkey::Pubkey, transaction::Transaction};

use crate::domain::{AppError, ConfigError, SignedTransaction, SignerRejection, TransferSigner};

/// Signer that authorizes transfers with a locally held keypair
pub struct KeypairSigner {
    keypair: Keypair,
}

impl KeypairSigner {
    #[must_use]
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// Load from a Base58-encoded secret (32-byte seed or 64-byte keypair).
    pub fn from_base58(secret: &SecretString) -> Result<Self, AppError> {
        let signing_key = signing_key_from_base58(secret)?;
        let keypair_bytes = signing_key.to_keypair_bytes();
        let keypair = Keypair::try_from(keypair_bytes.as_slice()).map_err(|e| {
            AppError::Config(ConfigError::InvalidSigningKey(format!(
                "failed to create keypair: {}",
                e
            )))
        })?;
        Ok(Self::new(keypair))
    }

    /// Public key of the signing identity
    #[must_use]
    pub fn public_key(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

#[async_trait]
impl TransferSigner for KeypairSigner {
    async fn sign_transaction(
        &self,
        mut transaction: Transaction,
    ) -> Result<SignedTransaction, SignerRejection> {
        let recent_blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[&self.keypair], recent_blockhash)
            .map_err(|e| SignerRejection::new(format!("signing failed: {}", e)))?;

        let bytes = bincode::serialize(&transaction)
            .map_err(|e| SignerRejection::new(format!("serialization failed: {}", e)))?;
        Ok(SignedTransaction::new(bytes))
    }
}

/// Parse a base58-encoded private key into a SigningKey.
///
/// Handles both 32-byte (seed) and 64-byte (full keypair) formats.
pub fn signing_key_from_base58(secret: &SecretString) -> Result<SigningKey, AppError> {
    let key_bytes = bs58::decode(secret.expose_secret())
        .into_vec()
        .map_err(|e| AppError::Config(ConfigError::InvalidSigningKey(e.to_string())))?;

    let key_array: [u8; 32] = if key_bytes.len() == 64 {
        // Solana keypair format: first 32 bytes are the secret key
        key_bytes[..32].try_into().map_err(|_| {
            AppError::Config(ConfigError::InvalidSigningKey(
                "invalid keypair format".to_string(),
            ))
        })?
    } else if key_bytes.len() == 32 {
        key_bytes.try_into().map_err(|v: Vec<u8>| {
            AppError::Config(ConfigError::InvalidSigningKey(format!(
                "key must be 32 bytes, got {}",
                v.len()
            )))
        })?
    } else {
        return Err(AppError::Config(ConfigError::InvalidSigningKey(format!(
            "key must be 32 or 64 bytes, got {}",
            key_bytes.len()
        ))));
    };

    Ok(SigningKey::from_bytes(&key_array))
}
