//! Action input and output schemas.

use crate::amount::is_positive_integer;
use crate::okx::Slippage;
use crate::{Error, Result};
use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

fn schema_any(_: &mut SchemaGenerator) -> Schema {
    true.into()
}

/// Wrapper for arbitrary JSON payloads when an action output is dynamic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[schemars(schema_with = "schema_any")]
#[ts(type = "any")]
pub struct AnyJson(pub Value);

impl AnyJson {
    pub fn new(value: Value) -> Self {
        Self(value)
    }
}

impl From<Value> for AnyJson {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<AnyJson> for Value {
    fn from(value: AnyJson) -> Self {
        value.0
    }
}

fn default_slippage() -> String {
    "0.5".to_string()
}

fn check_percent(field: &str, value: &str) -> Result<()> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && (0.0..=100.0).contains(&v) => Ok(()),
        _ => Err(Error::InvalidInput(format!(
            "{} must be a percentage between 0 and 100, got '{}'",
            field, value
        ))),
    }
}

fn check_pair(from: &str, to: &str, amount: &str) -> Result<()> {
    if from.trim().is_empty() {
        return Err(Error::InvalidInput("fromTokenAddress is required".to_string()));
    }
    if to.trim().is_empty() {
        return Err(Error::InvalidInput("toTokenAddress is required".to_string()));
    }
    if from.trim() == to.trim() {
        return Err(Error::InvalidInput(
            "fromTokenAddress and toTokenAddress must differ".to_string(),
        ));
    }
    if !is_positive_integer(amount.trim()) {
        return Err(Error::InvalidInput(format!(
            "amount must be a positive integer in minimal divisible units, got '{}'",
            amount
        )));
    }
    Ok(())
}

/// Input for actions that take no arguments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
#[serde(deny_unknown_fields)]
pub struct EmptyArgs {}

/// Quote input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct QuoteInput {
    /// The mint address of the token to swap from
    pub from_token_address: String,
    /// The mint address of the token to swap to
    pub to_token_address: String,
    /// The amount to swap in minimal divisible units
    pub amount: String,
    /// Maximum slippage percentage (e.g., "0.5" for 0.5%)
    #[serde(default = "default_slippage")]
    pub slippage: String,
}

impl QuoteInput {
    pub fn validate(&self) -> Result<()> {
        check_pair(&self.from_token_address, &self.to_token_address, &self.amount)?;
        check_percent("slippage", &self.slippage)
    }

    pub fn slippage(&self) -> Slippage {
        Slippage::Fixed(self.slippage.trim().to_string())
    }
}

/// Swap input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SwapInput {
    /// The mint address of the token to swap from
    pub from_token_address: String,
    /// The mint address of the token to swap to
    pub to_token_address: String,
    /// The amount to swap in minimal divisible units
    pub amount: String,
    /// Maximum slippage percentage (e.g., "0.5" for 0.5%)
    #[serde(default = "default_slippage")]
    pub slippage: String,
    /// Let the aggregator choose slippage
    #[serde(default)]
    pub auto_slippage: bool,
    /// Upper bound for automatic slippage; defaults to `slippage`
    #[serde(default)]
    #[ts(optional)]
    pub max_auto_slippage_percent: Option<String>,
}

impl SwapInput {
    pub fn validate(&self) -> Result<()> {
        check_pair(&self.from_token_address, &self.to_token_address, &self.amount)?;
        check_percent("slippage", &self.slippage)?;
        if let Some(max) = &self.max_auto_slippage_percent {
            check_percent("maxAutoSlippagePercent", max)?;
        }
        Ok(())
    }

    pub fn slippage(&self) -> Slippage {
        if self.auto_slippage {
            Slippage::Auto {
                max_percent: self
                    .max_auto_slippage_percent
                    .as_deref()
                    .unwrap_or(&self.slippage)
                    .trim()
                    .to_string(),
            }
        } else {
            Slippage::Fixed(self.slippage.trim().to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Success,
    Error,
}

/// Envelope returned by every action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct ActionResponse {
    pub status: ActionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub summary: Option<AnyJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub details: Option<String>,
}

impl ActionResponse {
    pub fn success(summary: Value) -> Self {
        Self {
            status: ActionStatus::Success,
            summary: Some(AnyJson(summary)),
            message: None,
            details: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn error(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: ActionStatus::Error,
            summary: None,
            message: Some(message.into()),
            details,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Success
    }
}
