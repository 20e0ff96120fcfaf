//! Error types for the OKX DEX plugin

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Missing OKX credentials: {0}")]
    MissingCredentials(String),

    #[error("Quote failed: {0}")]
    QuoteFailed(String),

    #[error("Swap failed: {0}")]
    SwapFailed(String),

    #[error("Unknown token: {0}")]
    UnknownToken(String),

    #[error("OKX API error: {0}")]
    Upstream(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Interceptor blocked: {0}")]
    Blocked(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
