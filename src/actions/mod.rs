//! Agent-facing actions
//!
//! Every OKX DEX operation is exposed as an [`ActionKind`] with a typed
//! input schema. Requests are parsed and validated into an
//! [`ActionRequest`] before any handler runs, then dispatched through
//! [`OkxDexPlugin::invoke`] with the interceptor pipeline wrapped around
//! the call.

mod types;

pub use types::{ActionResponse, ActionStatus, AnyJson, EmptyArgs, QuoteInput, SwapInput};

use crate::config::{ApiCredentials, Config};
use crate::interceptors::{InterceptorPipeline, InvocationContext};
use crate::okx::{OkxDexClient, QuoteData, QuoteRequest, Slippage};
use crate::swap::{
    describe_token, RpcSwapSubmitter, SwapExecutor, SwapRequest, SwapResult, SwapSubmitter,
};
use crate::tokens::TokenRegistry;
use crate::wallet::SecureWallet;
use crate::{Error, Result};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

/// The actions this plugin registers with a host agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    ChainData,
    Liquidity,
    Tokens,
    Quote,
    Swap,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::ChainData,
        ActionKind::Liquidity,
        ActionKind::Tokens,
        ActionKind::Quote,
        ActionKind::Swap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ActionKind::ChainData => "OKX_DEX_CHAIN_DATA",
            ActionKind::Liquidity => "OKX_DEX_LIQUIDITY",
            ActionKind::Tokens => "OKX_DEX_TOKENS",
            ActionKind::Quote => "OKX_DEX_QUOTE",
            ActionKind::Swap => "OKX_DEX_SWAP",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ActionKind::ChainData => "Get chain data from OKX DEX.",
            ActionKind::Liquidity => "Get liquidity information from OKX DEX.",
            ActionKind::Tokens => "List all tokens supported by OKX DEX.",
            ActionKind::Quote => "Get quote from OKX DEX.",
            ActionKind::Swap => "Execute a token swap on OKX DEX.",
        }
    }

    /// Alternative phrasings a host may use to select the action
    pub fn similes(self) -> &'static [&'static str] {
        match self {
            ActionKind::ChainData => &["get chain data", "okx dex chain data"],
            ActionKind::Liquidity => &["get liquidity", "okx dex liquidity"],
            ActionKind::Tokens => &["list tokens", "okx dex tokens"],
            ActionKind::Quote => &["get quote", "okx dex quote"],
            ActionKind::Swap => &["swap", "okx dex swap"],
        }
    }

    /// JSON Schema of the action's input
    pub fn input_schema(self) -> Value {
        match self {
            ActionKind::ChainData | ActionKind::Liquidity | ActionKind::Tokens => {
                schema_value::<EmptyArgs>()
            }
            ActionKind::Quote => schema_value::<QuoteInput>(),
            ActionKind::Swap => schema_value::<SwapInput>(),
        }
    }

    /// Name, description, similes and schema as one JSON object
    pub fn describe(self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "similes": self.similes(),
            "schema": self.input_schema(),
        })
    }
}

fn schema_value<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or(Value::Null)
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionKind {
    type Err = Error;

    /// Resolve an action by name or simile, ignoring case
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        ActionKind::ALL
            .into_iter()
            .find(|kind| {
                kind.name().eq_ignore_ascii_case(wanted)
                    || kind
                        .similes()
                        .iter()
                        .any(|simile| simile.eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| Error::InvalidInput(format!("Unknown action: {}", wanted)))
    }
}

/// A validated action invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ActionRequest {
    ChainData,
    Liquidity,
    Tokens,
    Quote(QuoteInput),
    Swap(SwapInput),
}

impl ActionRequest {
    /// Decode and validate raw JSON input for `kind`
    ///
    /// `null` is treated as an empty object.
    pub fn parse(kind: ActionKind, args: Value) -> Result<Self> {
        let args = if args.is_null() { json!({}) } else { args };

        match kind {
            ActionKind::ChainData => {
                decode::<EmptyArgs>(kind, args)?;
                Ok(ActionRequest::ChainData)
            }
            ActionKind::Liquidity => {
                decode::<EmptyArgs>(kind, args)?;
                Ok(ActionRequest::Liquidity)
            }
            ActionKind::Tokens => {
                decode::<EmptyArgs>(kind, args)?;
                Ok(ActionRequest::Tokens)
            }
            ActionKind::Quote => {
                let request = ActionRequest::Quote(decode(kind, args)?);
                request.validate()?;
                Ok(request)
            }
            ActionKind::Swap => {
                let request = ActionRequest::Swap(decode(kind, args)?);
                request.validate()?;
                Ok(request)
            }
        }
    }

    /// Check the input of a request built directly from its fields
    pub fn validate(&self) -> Result<()> {
        match self {
            ActionRequest::Quote(input) => input.validate(),
            ActionRequest::Swap(input) => input.validate(),
            ActionRequest::ChainData | ActionRequest::Liquidity | ActionRequest::Tokens => Ok(()),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            ActionRequest::ChainData => ActionKind::ChainData,
            ActionRequest::Liquidity => ActionKind::Liquidity,
            ActionRequest::Tokens => ActionKind::Tokens,
            ActionRequest::Quote(_) => ActionKind::Quote,
            ActionRequest::Swap(_) => ActionKind::Swap,
        }
    }

    pub fn slippage(&self) -> Option<Slippage> {
        match self {
            ActionRequest::Quote(input) => Some(input.slippage()),
            ActionRequest::Swap(input) => Some(input.slippage()),
            _ => None,
        }
    }

    /// Input as JSON, for audit records
    pub fn args(&self) -> Value {
        let value = match self {
            ActionRequest::Quote(input) => serde_json::to_value(input),
            ActionRequest::Swap(input) => serde_json::to_value(input),
            _ => Ok(json!({})),
        };
        value.unwrap_or(Value::Null)
    }
}

fn decode<T: DeserializeOwned>(kind: ActionKind, args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| Error::InvalidInput(format!("{}: {}", kind.name(), e)))
}

/// What the host knows about the calling agent
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// Wallet the agent expects to trade from
    pub wallet_address: Option<String>,
    pub rpc_url: Option<String>,
    pub config: Arc<Config>,
}

impl ActionContext {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            wallet_address: None,
            rpc_url: config.solana.rpc_url.clone(),
            config,
        }
    }

    pub fn with_wallet(mut self, wallet_address: impl Into<String>) -> Self {
        self.wallet_address = Some(wallet_address.into());
        self
    }
}

/// OKX DEX plugin: the action table bound to a client and swap executor
pub struct OkxDexPlugin {
    client: Arc<OkxDexClient>,
    executor: SwapExecutor,
    interceptors: InterceptorPipeline,
}

impl OkxDexPlugin {
    pub fn new(client: Arc<OkxDexClient>, executor: SwapExecutor) -> Self {
        Self {
            client,
            executor,
            interceptors: InterceptorPipeline::new(),
        }
    }

    /// Build the full plugin from configuration
    ///
    /// Without a wallet the plugin still serves read-only actions; swaps
    /// fail with `MissingCredentials`.
    pub fn from_config(
        config: &Config,
        credentials: Option<ApiCredentials>,
        wallet: Option<SecureWallet>,
    ) -> Result<Self> {
        let tokens = Arc::new(TokenRegistry::with_default_decimals(
            config.tokens.default_decimals,
        ));
        let client = Arc::new(OkxDexClient::from_config(config, credentials, tokens)?);

        let submitter: Option<Arc<dyn SwapSubmitter>> = match wallet {
            Some(wallet) => Some(Arc::new(RpcSwapSubmitter::new(
                wallet,
                config.solana.rpc().url(),
            )?)),
            None => None,
        };

        let executor = SwapExecutor::new(client.clone(), submitter)
            .with_explorer_template(&config.solana.explorer_tx_url);

        Ok(Self::new(client, executor).with_interceptors(InterceptorPipeline::from_config(config)))
    }

    pub fn with_interceptors(mut self, interceptors: InterceptorPipeline) -> Self {
        self.interceptors = interceptors;
        self
    }

    pub fn client(&self) -> &Arc<OkxDexClient> {
        &self.client
    }

    pub fn executor(&self) -> &SwapExecutor {
        &self.executor
    }

    /// Resolve an action by name or simile, validate its input and invoke it
    pub async fn invoke_named(
        &self,
        context: &ActionContext,
        name: &str,
        args: Value,
    ) -> Result<ActionResponse> {
        let kind: ActionKind = name.parse()?;
        let request = ActionRequest::parse(kind, args)?;
        self.invoke(context, request).await
    }

    /// Run one action through the interceptor pipeline
    ///
    /// The request is validated first; invalid input never reaches the
    /// interceptors or the network.
    pub async fn invoke(
        &self,
        context: &ActionContext,
        request: ActionRequest,
    ) -> Result<ActionResponse> {
        request.validate()?;

        let invocation = InvocationContext::new(request.kind(), request.args(), request.slippage());
        let started = Instant::now();

        tracing::debug!(
            action = request.kind().name(),
            invocation_id = %invocation.invocation_id,
            rpc_url = context.rpc_url.as_deref().unwrap_or("default"),
            "Invoking action"
        );

        let result = match self.interceptors.before(&invocation).await {
            Ok(()) => self.dispatch(context, request).await,
            Err(e) => Err(e),
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        self.interceptors
            .after(&invocation, &result, duration_ms)
            .await;

        result
    }

    async fn dispatch(
        &self,
        context: &ActionContext,
        request: ActionRequest,
    ) -> Result<ActionResponse> {
        if context.config.okx.chain_id != self.client.chain_id() {
            return Err(Error::Config(format!(
                "context chain {} does not match client chain {}",
                context.config.okx.chain_id,
                self.client.chain_id()
            )));
        }

        match request {
            ActionRequest::ChainData => {
                let chain_data = self.client.get_chain_data().await?;
                Ok(ActionResponse::success(json!({ "chainData": chain_data })))
            }
            ActionRequest::Liquidity => {
                let liquidity = self.client.get_liquidity().await?;
                Ok(ActionResponse::success(json!({ "liquidity": liquidity })))
            }
            ActionRequest::Tokens => {
                let tokens = self.client.get_tokens().await?;
                Ok(ActionResponse::success(json!({ "tokens": tokens })))
            }
            ActionRequest::Quote(input) => self.quote(input).await,
            ActionRequest::Swap(input) => self.swap(context, input).await,
        }
    }

    async fn quote(&self, input: QuoteInput) -> Result<ActionResponse> {
        let slippage = input.slippage();
        let quote = self
            .client
            .get_quote(&QuoteRequest {
                from_token_address: input.from_token_address.trim().to_string(),
                to_token_address: input.to_token_address.trim().to_string(),
                amount: input.amount.trim().to_string(),
                slippage,
            })
            .await?;

        Ok(self.quote_response(&input, &quote))
    }

    fn quote_response(&self, input: &QuoteInput, quote: &QuoteData) -> ActionResponse {
        let registry = self.client.tokens();
        let (from_symbol, from_amount) = describe_token(
            registry,
            input.from_token_address.trim(),
            &quote.from_token,
            &quote.from_token_amount,
        );
        let (to_symbol, to_amount) = describe_token(
            registry,
            input.to_token_address.trim(),
            &quote.to_token,
            &quote.to_token_amount,
        );
        let price_impact = quote.price_impact_percentage.as_deref().unwrap_or("0");

        let routes: Vec<Value> = quote
            .quote_compare_list
            .iter()
            .map(|route| {
                json!({
                    "dexName": route.dex_name,
                    "amountOut": route.amount_out,
                    "tradeFee": route.trade_fee,
                })
            })
            .collect();

        let message = format!(
            "Quote received: {} {} = {} {} ({}% price impact)",
            from_amount, from_symbol, to_amount, to_symbol, price_impact
        );

        ActionResponse::success(json!({
            "quote": {
                "fromToken": from_symbol,
                "toToken": to_symbol,
                "fromAmount": from_amount,
                "toAmount": to_amount,
                "fromTokenAmount": quote.from_token_amount,
                "toTokenAmount": quote.to_token_amount,
                "priceImpact": price_impact,
                "tradeFee": quote.trade_fee,
                "estimateGasFee": quote.estimate_gas_fee,
                "routes": routes,
            }
        }))
        .with_message(message)
    }

    async fn swap(&self, context: &ActionContext, input: SwapInput) -> Result<ActionResponse> {
        if let (Some(expected), Some(signer)) =
            (context.wallet_address.as_deref(), self.executor.wallet_address())
        {
            if expected != signer {
                return Err(Error::Wallet(format!(
                    "agent wallet {} does not match signing wallet {}",
                    expected, signer
                )));
            }
        }

        let request = SwapRequest {
            slippage: input.slippage(),
            from_token_address: input.from_token_address.trim().to_string(),
            to_token_address: input.to_token_address.trim().to_string(),
            amount: input.amount.trim().to_string(),
        };

        let result = self.executor.execute_swap(&request).await?;
        Ok(match result {
            SwapResult::Success {
                ref from_amount,
                ref from_token,
                ref to_amount,
                ref to_token,
                ref explorer_url,
                ..
            } => {
                let message = format!(
                    "Swapped {} {} for {} {}: {}",
                    from_amount, from_token, to_amount, to_token, explorer_url
                );
                ActionResponse::success(json!({ "swap": result })).with_message(message)
            }
            SwapResult::Error { message, details } => ActionResponse::error(message, details),
        })
    }
}
