//! Swap submission: sign the aggregator-built transaction and broadcast it

use crate::okx::SwapData;
use crate::wallet::SecureWallet;
use crate::{Error, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use std::time::Duration;

/// A broadcast transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedSwap {
    pub transaction_id: String,
    /// Explorer link, when the submitter knows one
    pub explorer_url: Option<String>,
}

/// Signs and submits swap transactions on behalf of one wallet
#[async_trait]
pub trait SwapSubmitter: Send + Sync {
    /// Public address of the signing wallet
    fn wallet_address(&self) -> &str;

    async fn submit(&self, swap: &SwapData) -> Result<SubmittedSwap>;
}

/// Decode the upstream transaction: base58 first, then base64
pub(crate) fn decode_transaction(encoded: &str) -> Result<Vec<u8>> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(Error::SwapFailed("swap response has no transaction data".to_string()));
    }

    bs58::decode(encoded)
        .into_vec()
        .or_else(|_| STANDARD.decode(encoded))
        .map_err(|_| {
            Error::SwapFailed("transaction data is neither base58 nor base64".to_string())
        })
}

/// Submitter that signs with a local wallet and broadcasts over Solana JSON-RPC
pub struct RpcSwapSubmitter {
    wallet: SecureWallet,
    rpc_url: String,
    client: reqwest::Client,
}

impl RpcSwapSubmitter {
    pub fn new(wallet: SecureWallet, rpc_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            wallet,
            rpc_url: rpc_url.into(),
            client,
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Decode and sign, returning the wire bytes to broadcast
    pub(crate) fn prepare(&self, swap: &SwapData) -> Result<Vec<u8>> {
        let tx_bytes = decode_transaction(&swap.tx.data)?;
        self.wallet
            .sign_transaction(&tx_bytes)
            .map_err(|e| Error::SwapFailed(e.to_string()))
    }

    /// Make a Solana JSON-RPC call
    async fn rpc_call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        });

        let resp = self.client.post(&self.rpc_url).json(&body).send().await?;
        let json: serde_json::Value = resp.json().await?;

        if let Some(error) = json.get("error") {
            return Err(Error::SwapFailed(format!("Solana RPC error: {}", error)));
        }

        json.get("result")
            .cloned()
            .ok_or_else(|| Error::SwapFailed("Solana RPC: missing 'result' field".to_string()))
    }
}

#[async_trait]
impl SwapSubmitter for RpcSwapSubmitter {
    fn wallet_address(&self) -> &str {
        self.wallet.address()
    }

    async fn submit(&self, swap: &SwapData) -> Result<SubmittedSwap> {
        let signed = self.prepare(swap)?;

        let result = self
            .rpc_call(
                "sendTransaction",
                json!([
                    STANDARD.encode(&signed),
                    {
                        "encoding": "base64",
                        "skipPreflight": false,
                        "preflightCommitment": "confirmed",
                        "maxRetries": 3
                    }
                ]),
            )
            .await?;

        let signature = result
            .as_str()
            .ok_or_else(|| Error::SwapFailed(format!("unexpected sendTransaction result: {}", result)))?
            .to_string();

        tracing::info!(signature = %signature, wallet = %self.wallet.address(), "Swap transaction broadcast");

        Ok(SubmittedSwap {
            transaction_id: signature,
            explorer_url: None,
        })
    }
}
