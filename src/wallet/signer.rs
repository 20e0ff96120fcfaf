//! Secure wallet implementation
//!
//! SECURITY: This is the ONLY place where private keys exist.
//! - Keys are held in an ed25519 `SigningKey`
//! - Keys are never serialized to JSON
//! - Keys are never logged

use super::transaction::{self, TransactionLayout};
use crate::{Error, Result};
use ed25519_dalek::{Signer, SigningKey};

/// Secure wallet that protects private keys
///
/// The private key is:
/// - Stored in an ed25519 `SigningKey`
/// - Never serialized (no Serialize impl)
/// - Only accessible via signing operations
pub struct SecureWallet {
    signing_key: SigningKey,
    /// Public address (base58, safe to expose)
    address: String,
}

impl SecureWallet {
    /// Create a wallet from an environment variable
    ///
    /// # Arguments
    /// * `var_name` - Name of the environment variable containing the private key
    ///
    /// # Security
    /// The environment variable should contain a base58-encoded keypair.
    /// Consider using a secrets manager in production.
    pub fn from_env(var_name: &str) -> Result<Self> {
        let key_b58 = std::env::var(var_name).map_err(|_| {
            Error::Wallet(format!(
                "Environment variable {} not set. Required for wallet initialization.",
                var_name
            ))
        })?;

        Self::from_base58(&key_b58)
    }

    /// Create a wallet from a base58 key
    ///
    /// Accepts the 64-byte Solana keypair (secret followed by public key) or
    /// a bare 32-byte secret.
    pub fn from_base58(key_b58: &str) -> Result<Self> {
        let bytes = bs58::decode(key_b58.trim())
            .into_vec()
            .map_err(|e| Error::Wallet(format!("Invalid base58 private key: {}", e)))?;

        let secret: [u8; 32] = match bytes.len() {
            32 | 64 => {
                let mut secret = [0u8; 32];
                secret.copy_from_slice(&bytes[..32]);
                secret
            }
            n => {
                return Err(Error::Wallet(format!(
                    "Invalid private key length: expected 32 or 64 bytes, got {}",
                    n
                )))
            }
        };

        let signing_key = SigningKey::from_bytes(&secret);
        let public_key = signing_key.verifying_key();

        if bytes.len() == 64 && bytes[32..] != public_key.as_bytes()[..] {
            return Err(Error::Wallet(
                "Keypair public half does not match its secret".to_string(),
            ));
        }

        Ok(Self {
            address: bs58::encode(public_key.as_bytes()).into_string(),
            signing_key,
        })
    }

    /// Get the public address (safe to share)
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Sign arbitrary bytes
    pub fn sign_message(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Sign a serialized transaction built by the aggregator
    ///
    /// The wallet must be the fee payer (first account key); its signature
    /// is placed in the first signature slot. Legacy and v0 messages are
    /// both supported.
    pub fn sign_transaction(&self, tx_bytes: &[u8]) -> Result<Vec<u8>> {
        let layout = TransactionLayout::parse(tx_bytes)?;

        let fee_payer = layout.fee_payer(tx_bytes)?;
        if fee_payer != self.signing_key.verifying_key().as_bytes() {
            return Err(Error::Wallet(format!(
                "Transaction fee payer {} is not this wallet ({})",
                bs58::encode(fee_payer).into_string(),
                self.address
            )));
        }

        let signature = self.sign_message(layout.message(tx_bytes));
        let signed = transaction::place_signature(tx_bytes, &layout, &signature);

        tracing::debug!(
            versioned = layout.versioned,
            signatures = layout.num_signatures,
            message_len = tx_bytes.len() - layout.message_offset,
            "Transaction signed"
        );

        Ok(signed)
    }
}

// Implement Debug manually to avoid exposing the signing key
impl std::fmt::Debug for SecureWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureWallet")
            .field("address", &self.address)
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}
