//! Swap execution
//!
//! Quote first, then build, sign and broadcast. Input and credential
//! problems and quote failures abort with an error; once the quote is in
//! hand, failures are reported as [`SwapResult::Error`] so callers always
//! get a structured outcome for an attempted execution.

mod submitter;

pub use submitter::{RpcSwapSubmitter, SubmittedSwap, SwapSubmitter};

use crate::amount::{format_units, is_positive_integer, short_address};
use crate::config::DEFAULT_EXPLORER_TX_URL;
use crate::okx::{OkxDexClient, QuoteData, QuoteRequest, QuoteToken, Slippage, SwapTxRequest};
use crate::tokens::{normalize_swap_address, TokenRegistry, MAX_DECIMALS};
use crate::{Error, Result};
use serde::Serialize;
use std::sync::Arc;

/// A swap in base units, addressed by the caller's mint addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub from_token_address: String,
    pub to_token_address: String,
    pub amount: String,
    pub slippage: Slippage,
}

/// Outcome of an attempted swap
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum SwapResult {
    Success {
        transaction_id: String,
        explorer_url: String,
        from_token: String,
        to_token: String,
        /// Human-readable amount sent
        from_amount: String,
        /// Human-readable amount received
        to_amount: String,
        /// `to_amount / from_amount`
        exchange_rate: f64,
    },
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
}

impl SwapResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SwapResult::Success { .. })
    }
}

/// Orchestrates quote, transaction build and submission
pub struct SwapExecutor {
    client: Arc<OkxDexClient>,
    submitter: Option<Arc<dyn SwapSubmitter>>,
    explorer_tx_url: String,
}

impl SwapExecutor {
    pub fn new(client: Arc<OkxDexClient>, submitter: Option<Arc<dyn SwapSubmitter>>) -> Self {
        Self {
            client,
            submitter,
            explorer_tx_url: DEFAULT_EXPLORER_TX_URL.to_string(),
        }
    }

    /// Explorer template; `{tx_id}` is replaced with the signature
    pub fn with_explorer_template(mut self, template: &str) -> Self {
        self.explorer_tx_url = template.to_string();
        self
    }

    pub fn wallet_address(&self) -> Option<&str> {
        self.submitter.as_deref().map(|s| s.wallet_address())
    }

    /// Execute a swap
    ///
    /// # Errors
    /// - `InvalidInput` for a non-integer amount (before any I/O)
    /// - `MissingCredentials` when no wallet is configured (before any I/O)
    /// - any quote error, in which case nothing is executed
    pub async fn execute_swap(&self, request: &SwapRequest) -> Result<SwapResult> {
        if !is_positive_integer(&request.amount) {
            return Err(Error::InvalidInput(format!(
                "amount must be a positive integer in base units, got '{}'",
                request.amount
            )));
        }

        let submitter = self.submitter.as_ref().ok_or_else(|| {
            Error::MissingCredentials(
                "wallet private key (OKX_SOLANA_PRIVATE_KEY or SOLANA_PRIVATE_KEY)".to_string(),
            )
        })?;

        let from_address = normalize_swap_address(&request.from_token_address);
        let to_address = normalize_swap_address(&request.to_token_address);

        let quote = self
            .client
            .get_quote(&QuoteRequest {
                from_token_address: from_address.to_string(),
                to_token_address: to_address.to_string(),
                amount: request.amount.clone(),
                slippage: request.slippage.clone(),
            })
            .await?;

        let tx_request = SwapTxRequest {
            from_token_address: from_address.to_string(),
            to_token_address: to_address.to_string(),
            amount: request.amount.clone(),
            slippage: request.slippage.clone(),
            user_wallet_address: submitter.wallet_address().to_string(),
        };

        let swap = match self.client.get_swap_transaction(&tx_request).await {
            Ok(swap) => swap,
            Err(e) => return Ok(execution_error("building swap transaction", e)),
        };

        let submitted = match submitter.submit(&swap).await {
            Ok(submitted) => submitted,
            Err(e) => return Ok(execution_error("submitting transaction", e)),
        };

        let result = self.shape_result(request, &quote, submitted);
        if let SwapResult::Success {
            transaction_id,
            from_amount,
            to_amount,
            ..
        } = &result
        {
            tracing::info!(
                tx = %transaction_id,
                from_amount = %from_amount,
                to_amount = %to_amount,
                "Swap executed"
            );
        }
        Ok(result)
    }

    fn shape_result(
        &self,
        request: &SwapRequest,
        quote: &QuoteData,
        submitted: SubmittedSwap,
    ) -> SwapResult {
        let registry = self.client.tokens();
        let (from_token, from_amount) = describe_token(
            registry,
            &request.from_token_address,
            &quote.from_token,
            &quote.from_token_amount,
        );
        let (to_token, to_amount) = describe_token(
            registry,
            &request.to_token_address,
            &quote.to_token,
            &quote.to_token_amount,
        );

        let exchange_rate = match (from_amount.parse::<f64>(), to_amount.parse::<f64>()) {
            (Ok(from), Ok(to)) if from > 0.0 => to / from,
            _ => 0.0,
        };

        let explorer_url = submitted
            .explorer_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| {
                self.explorer_tx_url
                    .replace("{tx_id}", &submitted.transaction_id)
            });

        SwapResult::Success {
            transaction_id: submitted.transaction_id,
            explorer_url,
            from_token,
            to_token,
            from_amount,
            to_amount,
            exchange_rate,
        }
    }
}

/// Symbol and exact human amount for one side of a quote
///
/// Decimals come from the quote, then the registry. The symbol prefers what
/// the registry knows for the caller's address, then the quote's symbol,
/// then a shortened address.
pub(crate) fn describe_token(
    registry: &TokenRegistry,
    original: &str,
    token: &QuoteToken,
    base_amount: &str,
) -> (String, String) {
    let decimals = token
        .decimal
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|d| *d <= MAX_DECIMALS)
        .unwrap_or_else(|| registry.decimals_for(original));

    let symbol = registry
        .symbol_for(original)
        .or_else(|| Some(token.token_symbol.clone()).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| short_address(original));

    (symbol, format_units(base_amount, decimals))
}

fn execution_error(stage: &str, err: Error) -> SwapResult {
    tracing::warn!(stage, error = %err, "Swap execution failed");
    SwapResult::Error {
        message: err.to_string(),
        details: Some(format!("failed while {}", stage)),
    }
}
