//! OKX DEX aggregator client
//!
//! Thin signed-request wrapper over the aggregator endpoints. Credentials
//! are checked and requests are signed before anything reaches the
//! transport, so a missing credential never costs a network call.

use super::signer::{self, HttpMethod};
use super::transport::{ApiRequest, HttpTransport, ReqwestTransport};
use super::types::{
    parse_envelope, ChainData, EnvelopeError, LiquiditySource, QuoteData, QuoteRequest, SwapData,
    SwapTxRequest, TokenListing,
};
use crate::amount::is_positive_integer;
use crate::config::{ApiCredentials, Config};
use crate::tokens::{chains, TokenInfo, TokenRegistry};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Version prefix included in both the URL and the signed path
pub const API_PREFIX: &str = "/api/v5";

/// Aggregator endpoints, relative to [`API_PREFIX`]
pub mod endpoints {
    pub const QUOTE: &str = "/dex/aggregator/quote";
    pub const SWAP: &str = "/dex/aggregator/swap";
    pub const LIQUIDITY: &str = "/dex/aggregator/get-liquidity";
    pub const SUPPORTED_CHAIN: &str = "/dex/aggregator/supported/chain";
    pub const ALL_TOKENS: &str = "/dex/aggregator/all-tokens";
}

/// Why a call failed before relabelling for the caller
enum CallError {
    /// Raised before any I/O; surfaced unchanged
    Local(Error),
    /// Upstream, transport or shape failure; carries the message
    Remote(String),
}

impl From<EnvelopeError> for CallError {
    fn from(err: EnvelopeError) -> Self {
        CallError::Remote(err.to_string())
    }
}

impl CallError {
    fn relabel(self, wrap: fn(String) -> Error) -> Error {
        match self {
            CallError::Local(err) => err,
            CallError::Remote(message) => wrap(message),
        }
    }
}

/// Client for the OKX DEX aggregator API
pub struct OkxDexClient {
    credentials: Option<ApiCredentials>,
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<TokenRegistry>,
    chain_id: String,
}

impl OkxDexClient {
    /// Create a client for Solana over the given transport
    pub fn new(
        credentials: Option<ApiCredentials>,
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<TokenRegistry>,
    ) -> Self {
        Self {
            credentials,
            transport,
            tokens,
            chain_id: chains::SOLANA.to_string(),
        }
    }

    /// Create a client with a `reqwest` transport built from configuration
    pub fn from_config(
        config: &Config,
        credentials: Option<ApiCredentials>,
        tokens: Arc<TokenRegistry>,
    ) -> Result<Self> {
        let transport = ReqwestTransport::new(
            &config.okx.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )?;

        Ok(Self::new(credentials, Arc::new(transport), tokens).with_chain_id(&config.okx.chain_id))
    }

    pub fn with_chain_id(mut self, chain_id: &str) -> Self {
        self.chain_id = chain_id.to_string();
        self
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Shared token registry
    pub fn tokens(&self) -> &Arc<TokenRegistry> {
        &self.tokens
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    fn credentials(&self) -> Result<&ApiCredentials> {
        self.credentials.as_ref().ok_or_else(|| {
            Error::MissingCredentials(
                "OKX_API_KEY, OKX_SECRET_KEY, OKX_API_PASSPHRASE, OKX_PROJECT_ID".to_string(),
            )
        })
    }

    /// Sign and send a GET, decoding the envelope's `data` list
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> std::result::Result<Vec<T>, CallError> {
        let credentials = self.credentials().map_err(CallError::Local)?;

        let path = format!("{}{}", API_PREFIX, endpoint);
        let query = signer::encode_query(params);
        let signed = signer::sign_request(credentials, HttpMethod::Get, &path, &query, None)
            .map_err(CallError::Local)?;

        let request = ApiRequest {
            method: HttpMethod::Get,
            headers: signed.headers(credentials),
            path,
            query,
            body: None,
        };

        let body = self.transport.send(request).await.map_err(|e| match e {
            Error::Upstream(message) => CallError::Remote(message),
            other => CallError::Remote(other.to_string()),
        })?;

        Ok(parse_envelope(&body)?)
    }

    /// Get a swap quote
    ///
    /// # Errors
    /// - `InvalidInput` for a non-integer amount or empty addresses (no I/O)
    /// - `MissingCredentials` when no credentials are configured (no I/O)
    /// - `QuoteFailed` for upstream, transport and shape failures
    pub async fn get_quote(&self, request: &QuoteRequest) -> Result<QuoteData> {
        if !is_positive_integer(&request.amount) {
            return Err(Error::InvalidInput(format!(
                "amount must be a positive integer in base units, got '{}'",
                request.amount
            )));
        }
        if request.from_token_address.trim().is_empty()
            || request.to_token_address.trim().is_empty()
        {
            return Err(Error::InvalidInput(
                "fromTokenAddress and toTokenAddress are required".to_string(),
            ));
        }
        if request.slippage.percent_value().is_none() {
            return Err(Error::InvalidInput(format!(
                "slippage must be a non-negative number, got '{}'",
                request.slippage.percent()
            )));
        }

        let params = [
            ("chainId", self.chain_id.clone()),
            ("amount", request.amount.clone()),
            ("fromTokenAddress", request.from_token_address.clone()),
            ("toTokenAddress", request.to_token_address.clone()),
            ("slippage", request.slippage.percent().to_string()),
        ];

        let quote = self
            .get::<QuoteData>(endpoints::QUOTE, &params)
            .await
            .map_err(|e| e.relabel(Error::QuoteFailed))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::QuoteFailed("no data".to_string()))?;

        for token in [&quote.from_token, &quote.to_token] {
            let recorded = TokenInfo::from_upstream(
                &token.token_symbol,
                &token.token_contract_address,
                &token.decimal,
            )
            .and_then(|info| self.tokens.upsert(info));
            if let Err(e) = recorded {
                tracing::warn!(
                    address = %token.token_contract_address,
                    error = %e,
                    "Could not cache token metadata from quote"
                );
            }
        }

        tracing::info!(
            from = %quote.from_token.token_symbol,
            to = %quote.to_token.token_symbol,
            from_amount = %quote.from_token_amount,
            to_amount = %quote.to_token_amount,
            routes = quote.quote_compare_list.len(),
            "Quote received"
        );

        Ok(quote)
    }

    /// Build an unsigned swap transaction for the user's wallet
    pub async fn get_swap_transaction(&self, request: &SwapTxRequest) -> Result<SwapData> {
        if !is_positive_integer(&request.amount) {
            return Err(Error::InvalidInput(format!(
                "amount must be a positive integer in base units, got '{}'",
                request.amount
            )));
        }

        let mut params = vec![
            ("chainId", self.chain_id.clone()),
            ("amount", request.amount.clone()),
            ("fromTokenAddress", request.from_token_address.clone()),
            ("toTokenAddress", request.to_token_address.clone()),
            ("userWalletAddress", request.user_wallet_address.clone()),
        ];
        params.extend(request.slippage.swap_params());

        let swap = self
            .get::<SwapData>(endpoints::SWAP, &params)
            .await
            .map_err(|e| e.relabel(Error::SwapFailed))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::SwapFailed("no data".to_string()))?;

        tracing::info!(
            from = %request.from_token_address,
            to = %request.to_token_address,
            amount = %request.amount,
            "Swap transaction built"
        );

        Ok(swap)
    }

    /// Liquidity venues available on this chain
    pub async fn get_liquidity(&self) -> Result<Vec<LiquiditySource>> {
        let sources = self
            .get(endpoints::LIQUIDITY, &[("chainId", self.chain_id.clone())])
            .await
            .map_err(|e| e.relabel(Error::Upstream))?;

        tracing::debug!(count = sources.len(), "Liquidity sources fetched");
        Ok(sources)
    }

    /// Supported-chain metadata for this chain
    pub async fn get_chain_data(&self) -> Result<Vec<ChainData>> {
        self.get(endpoints::SUPPORTED_CHAIN, &[("chainId", self.chain_id.clone())])
            .await
            .map_err(|e| e.relabel(Error::Upstream))
    }

    /// Tokens tradable on this chain; listed tokens are cached in the registry
    pub async fn get_tokens(&self) -> Result<Vec<TokenListing>> {
        let listings: Vec<TokenListing> = self
            .get(endpoints::ALL_TOKENS, &[("chainId", self.chain_id.clone())])
            .await
            .map_err(|e| e.relabel(Error::Upstream))?;

        let mut cached = 0usize;
        for listing in &listings {
            match TokenInfo::from_upstream(&listing.symbol, &listing.address, &listing.decimals)
                .and_then(|info| self.tokens.upsert(info))
            {
                Ok(()) => cached += 1,
                Err(e) => tracing::debug!(address = %listing.address, error = %e, "Skipping listed token"),
            }
        }

        tracing::info!(listed = listings.len(), cached, "Token list fetched");
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::okx::transport::StubTransport;
    use crate::okx::types::{fixtures, Slippage};
    use crate::tokens::addresses;
    use serde_json::json;

    fn credentials() -> ApiCredentials {
        ApiCredentials::new("key", "secret", "pass", "project").unwrap()
    }

    fn client_with(stub: Arc<StubTransport>, creds: Option<ApiCredentials>) -> OkxDexClient {
        OkxDexClient::new(creds, stub, Arc::new(TokenRegistry::new()))
    }

    fn quote_request(amount: &str) -> QuoteRequest {
        QuoteRequest {
            from_token_address: addresses::NATIVE_SOL.to_string(),
            to_token_address: addresses::USDC.to_string(),
            amount: amount.to_string(),
            slippage: Slippage::default(),
        }
    }

    #[tokio::test]
    async fn test_quote_success_signs_and_records_tokens() {
        let stub = Arc::new(StubTransport::new());
        stub.push_json(fixtures::sol_usdc_quote());
        let client = client_with(stub.clone(), Some(credentials()));

        let quote = client.get_quote(&quote_request("1000000000")).await.unwrap();
        assert_eq!(quote.to_token_amount, "20500000");

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.path, "/api/v5/dex/aggregator/quote");
        assert_eq!(req.query_param("chainId").as_deref(), Some("501"));
        assert_eq!(req.query_param("amount").as_deref(), Some("1000000000"));
        assert_eq!(req.query_param("slippage").as_deref(), Some("0.5"));
        assert!(req.header("OK-ACCESS-SIGN").is_some());
        assert_eq!(req.header("OK-ACCESS-PROJECT"), Some("project"));

        // Signature covers the exact wire query
        let ts = req.header("OK-ACCESS-TIMESTAMP").unwrap();
        let expected = signer::sign_with_timestamp(
            &credentials(),
            ts,
            HttpMethod::Get,
            &req.path,
            &req.query,
            None,
        )
        .unwrap();
        assert_eq!(req.header("OK-ACCESS-SIGN"), Some(expected.signature.as_str()));

        // Native SOL sentinel learned from the quote
        assert_eq!(client.tokens().decimals_for(addresses::NATIVE_SOL), 9);
        assert_eq!(client.tokens().symbol_for(addresses::NATIVE_SOL).as_deref(), Some("SOL"));
    }

    #[tokio::test]
    async fn test_missing_credentials_makes_no_calls() {
        let stub = Arc::new(StubTransport::new());
        let client = client_with(stub.clone(), None);

        let err = client.get_quote(&quote_request("1000")).await.unwrap_err();
        assert!(matches!(err, Error::MissingCredentials(_)));
        assert!(matches!(client.get_liquidity().await, Err(Error::MissingCredentials(_))));
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_amount_makes_no_calls() {
        let stub = Arc::new(StubTransport::new());
        let client = client_with(stub.clone(), Some(credentials()));

        for amount in ["0", "1.5", "-3", ""] {
            let err = client.get_quote(&quote_request(amount)).await.unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "amount {:?}", amount);
        }
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_upstream_error_code() {
        let stub = Arc::new(StubTransport::new());
        stub.push_json(json!({"code": "82000", "msg": "Insufficient liquidity", "data": []}));
        let client = client_with(stub, Some(credentials()));

        match client.get_quote(&quote_request("1000")).await.unwrap_err() {
            Error::QuoteFailed(msg) => assert_eq!(msg, "Insufficient liquidity"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_data_is_quote_failure() {
        let stub = Arc::new(StubTransport::new());
        stub.push_json(json!({"code": "0", "msg": "", "data": []}));
        let client = client_with(stub, Some(credentials()));

        match client.get_quote(&quote_request("1000")).await.unwrap_err() {
            Error::QuoteFailed(msg) => assert_eq!(msg, "no data"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_quote_failure() {
        let stub = Arc::new(StubTransport::new());
        stub.push_failure("connection reset");
        let client = client_with(stub, Some(credentials()));

        match client.get_quote(&quote_request("1000")).await.unwrap_err() {
            Error::QuoteFailed(msg) => assert!(msg.contains("connection reset")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bad_token_metadata_does_not_fail_quote() {
        let mut body = fixtures::sol_usdc_quote();
        body["data"][0]["toToken"]["decimal"] = json!("forty");
        let stub = Arc::new(StubTransport::new());
        stub.push_json(body);
        let client = client_with(stub, Some(credentials()));

        let quote = client.get_quote(&quote_request("1000000000")).await.unwrap();
        assert_eq!(quote.to_token.decimal, "forty");
        assert_eq!(client.tokens().decimals_for(addresses::USDC), 6);
    }

    #[tokio::test]
    async fn test_swap_transaction_params() {
        let stub = Arc::new(StubTransport::new());
        stub.push_json(fixtures::swap_tx("abc"));
        let client = client_with(stub.clone(), Some(credentials()));

        let swap = client
            .get_swap_transaction(&SwapTxRequest {
                from_token_address: addresses::NATIVE_SOL.to_string(),
                to_token_address: addresses::USDC.to_string(),
                amount: "1000000000".to_string(),
                slippage: Slippage::Auto {
                    max_percent: "2".to_string(),
                },
                user_wallet_address: "Wallet111".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(swap.tx.data, "abc");

        let req = &stub.requests()[0];
        assert_eq!(req.path, "/api/v5/dex/aggregator/swap");
        assert_eq!(req.query_param("userWalletAddress").as_deref(), Some("Wallet111"));
        assert_eq!(req.query_param("autoSlippage").as_deref(), Some("true"));
        assert_eq!(req.query_param("maxAutoSlippage").as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_swap_transaction_failure_is_swap_failed() {
        let stub = Arc::new(StubTransport::new());
        stub.push_json(json!({"code": "1", "msg": "bad route", "data": []}));
        let client = client_with(stub, Some(credentials()));

        let err = client
            .get_swap_transaction(&SwapTxRequest {
                from_token_address: addresses::NATIVE_SOL.to_string(),
                to_token_address: addresses::USDC.to_string(),
                amount: "1".to_string(),
                slippage: Slippage::default(),
                user_wallet_address: "w".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SwapFailed(ref msg) if msg == "bad route"));
    }

    #[tokio::test]
    async fn test_listing_endpoints() {
        let stub = Arc::new(StubTransport::new());
        stub.push_json(json!({"code": "0", "msg": "", "data": [
            {"id": "1", "name": "Raydium", "logo": "https://logo/r"}
        ]}));
        stub.push_json(json!({"code": "0", "msg": "", "data": [
            {"chainId": 501, "chainName": "Solana", "dexTokenApproveAddress": null}
        ]}));
        stub.push_json(json!({"code": "0", "msg": "", "data": [
            {"decimals": "5", "tokenContractAddress": "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263",
             "tokenLogoUrl": "", "tokenName": "Bonk", "tokenSymbol": "BONK"}
        ]}));
        let client = client_with(stub.clone(), Some(credentials()));

        assert_eq!(client.get_liquidity().await.unwrap()[0].name, "Raydium");
        assert_eq!(client.get_chain_data().await.unwrap()[0].chain_id, "501");
        assert_eq!(client.get_tokens().await.unwrap()[0].symbol, "BONK");
        assert_eq!(client.tokens().resolve("bonk").unwrap().decimals, 5);

        let paths: Vec<String> = stub.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            vec![
                "/api/v5/dex/aggregator/get-liquidity",
                "/api/v5/dex/aggregator/supported/chain",
                "/api/v5/dex/aggregator/all-tokens",
            ]
        );
    }

    #[tokio::test]
    async fn test_listing_failure_is_upstream() {
        let stub = Arc::new(StubTransport::new());
        stub.push_json(json!({"code": "50011", "msg": "Too many requests"}));
        let client = client_with(stub, Some(credentials()));
        assert!(matches!(
            client.get_chain_data().await,
            Err(Error::Upstream(ref msg)) if msg == "Too many requests"
        ));
    }
}
