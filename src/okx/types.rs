//! Typed shapes of the OKX DEX aggregator API
//!
//! Upstream responses are `{ code, msg, data: [...] }`. `code` arrives as a
//! string or a number depending on the endpoint; numeric fields such as
//! decimals do the same, so both are normalized to strings here.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Accept a JSON string or number and keep it as a string
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Str(s)) => Some(s),
        Some(Raw::Num(n)) => Some(n.to_string()),
        None => None,
    })
}

/// Slippage setting for quote and swap requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slippage {
    /// Fixed tolerance in percent, e.g. "0.5"
    Fixed(String),
    /// Let the aggregator pick, bounded by `max_percent`
    Auto { max_percent: String },
}

impl Slippage {
    /// The percent bound this setting allows
    pub fn percent(&self) -> &str {
        match self {
            Slippage::Fixed(percent) => percent,
            Slippage::Auto { max_percent } => max_percent,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Slippage::Auto { .. })
    }

    /// Query parameters for the swap endpoint
    pub fn swap_params(&self) -> Vec<(&'static str, String)> {
        match self {
            Slippage::Fixed(percent) => vec![("slippage", percent.clone())],
            Slippage::Auto { max_percent } => vec![
                ("slippage", max_percent.clone()),
                ("autoSlippage", "true".to_string()),
                ("maxAutoSlippage", max_percent.clone()),
            ],
        }
    }

    /// Parse the percent as a number
    pub fn percent_value(&self) -> Option<f64> {
        self.percent()
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
    }
}

impl Default for Slippage {
    fn default() -> Self {
        Slippage::Fixed("0.5".to_string())
    }
}

impl fmt::Display for Slippage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slippage::Fixed(percent) => write!(f, "{}%", percent),
            Slippage::Auto { max_percent } => write!(f, "auto (max {}%)", max_percent),
        }
    }
}

/// Quote request in base units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub from_token_address: String,
    pub to_token_address: String,
    /// Base-unit integer string
    pub amount: String,
    pub slippage: Slippage,
}

/// Swap-transaction request in base units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapTxRequest {
    pub from_token_address: String,
    pub to_token_address: String,
    pub amount: String,
    pub slippage: Slippage,
    pub user_wallet_address: String,
}

/// Token metadata embedded in a quote
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteToken {
    pub token_contract_address: String,
    #[serde(default)]
    pub token_symbol: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub token_unit_price: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub decimal: String,
    #[serde(default)]
    pub is_honey_pot: bool,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub tax_rate: Option<String>,
}

/// One venue's quote for the same trade
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteQuote {
    pub dex_name: String,
    #[serde(default)]
    pub dex_logo: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub trade_fee: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub amount_out: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub price_impact_percentage: Option<String>,
}

/// Quote result (first element of `data`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteData {
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub chain_id: Option<String>,
    pub from_token: QuoteToken,
    pub to_token: QuoteToken,
    #[serde(deserialize_with = "string_or_number")]
    pub from_token_amount: String,
    #[serde(deserialize_with = "string_or_number")]
    pub to_token_amount: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub price_impact_percentage: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub trade_fee: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub estimate_gas_fee: Option<String>,
    #[serde(default)]
    pub dex_router_list: Vec<Value>,
    /// Upstream ordering preserved
    #[serde(default)]
    pub quote_compare_list: Vec<RouteQuote>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub origin_to_token_amount: Option<String>,
}

/// Unsigned transaction returned by the swap endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapTx {
    /// Serialized transaction (base58, occasionally base64)
    pub data: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub min_receive_amount: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub slippage: Option<String>,
    #[serde(default)]
    pub signature_data: Vec<String>,
}

/// Swap endpoint result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapData {
    #[serde(default)]
    pub router_result: Option<QuoteData>,
    pub tx: SwapTx,
}

/// A liquidity venue available to the aggregator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquiditySource {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
}

/// Supported-chain metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainData {
    #[serde(deserialize_with = "string_or_number")]
    pub chain_id: String,
    pub chain_name: String,
    #[serde(default)]
    pub dex_token_approve_address: Option<String>,
}

/// Token as listed by the all-tokens endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenListing {
    #[serde(rename = "tokenSymbol")]
    pub symbol: String,
    #[serde(rename = "tokenName", default)]
    pub name: String,
    #[serde(rename = "tokenContractAddress")]
    pub address: String,
    #[serde(deserialize_with = "string_or_number")]
    pub decimals: String,
    #[serde(rename = "tokenLogoUrl", default)]
    pub logo_url: Option<String>,
}

/// Why an envelope did not yield data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Non-zero `code`; carries the upstream message
    Api { code: String, msg: String },
    /// Body or `data` did not match the expected shape
    Shape(String),
}

impl fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeError::Api { code, msg } if msg.is_empty() => {
                write!(f, "upstream returned code {}", code)
            }
            EnvelopeError::Api { msg, .. } => f.write_str(msg),
            EnvelopeError::Shape(msg) => write!(f, "unexpected response shape: {}", msg),
        }
    }
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(deserialize_with = "string_or_number")]
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Value,
}

/// Parse `{ code, msg, data }` and decode `data` as a list of `T`
///
/// `code` must be `"0"`. A null or missing `data` yields an empty list; a
/// single object is accepted as a one-element list.
pub fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, EnvelopeError> {
    let envelope: RawEnvelope =
        serde_json::from_str(body).map_err(|e| EnvelopeError::Shape(e.to_string()))?;

    if envelope.code != "0" {
        return Err(EnvelopeError::Api {
            code: envelope.code,
            msg: envelope.msg,
        });
    }

    let data = match envelope.data {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => Value::Array(items),
        other => Value::Array(vec![other]),
    };

    serde_json::from_value(data).map_err(|e| EnvelopeError::Shape(e.to_string()))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    /// Quote of 1 SOL for 20.5 USDC
    pub fn sol_usdc_quote() -> Value {
        json!({
            "code": "0",
            "msg": "",
            "data": [{
                "chainId": "501",
                "fromToken": {
                    "tokenContractAddress": "11111111111111111111111111111111",
                    "tokenSymbol": "SOL",
                    "tokenUnitPrice": "20.5",
                    "decimal": "9",
                    "isHoneyPot": false,
                    "taxRate": "0"
                },
                "toToken": {
                    "tokenContractAddress": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                    "tokenSymbol": "USDC",
                    "tokenUnitPrice": "1",
                    "decimal": 6,
                    "isHoneyPot": false,
                    "taxRate": "0"
                },
                "fromTokenAmount": "1000000000",
                "toTokenAmount": "20500000",
                "priceImpactPercentage": "0.04",
                "tradeFee": "0.0012",
                "estimateGasFee": "5000",
                "dexRouterList": [],
                "quoteCompareList": [
                    { "dexName": "Raydium", "dexLogo": "", "tradeFee": "0.001", "amountOut": "20.5" },
                    { "dexName": "Orca", "dexLogo": "", "tradeFee": "0.001", "amountOut": "20.4" }
                ]
            }]
        })
    }

    pub fn swap_tx(data: &str) -> Value {
        json!({
            "code": "0",
            "msg": "",
            "data": [{
                "routerResult": sol_usdc_quote()["data"][0].clone(),
                "tx": {
                    "data": data,
                    "from": "wallet",
                    "to": "router",
                    "minReceiveAmount": "20397500",
                    "slippage": "0.5",
                    "signatureData": []
                }
            }]
        })
    }
}
