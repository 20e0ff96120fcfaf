//! Configuration for the OKX DEX plugin

pub mod credentials;
pub mod rpc;

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// Re-export
pub use credentials::ApiCredentials;
pub use rpc::RpcConfig;

/// Wallet private key environment variables, in priority order
pub const WALLET_KEY_ENVS: [&str; 2] = ["OKX_SOLANA_PRIVATE_KEY", "SOLANA_PRIVATE_KEY"];

/// Explorer link template; `{tx_id}` is replaced with the signature
pub const DEFAULT_EXPLORER_TX_URL: &str = "https://solscan.io/tx/{tx_id}";

/// Audit log written when the configuration does not name one
pub const DEFAULT_AUDIT_LOG_PATH: &str = "okx-dex-audit.jsonl";

/// OKX API endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkxSettings {
    /// API host, without the `/api/v5` prefix
    pub base_url: String,
    /// Aggregator chain id ("501" = Solana)
    pub chain_id: String,
}

impl Default for OkxSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.okx.com".to_string(),
            chain_id: crate::tokens::chains::SOLANA.to_string(),
        }
    }
}

/// Solana network settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolanaSettings {
    /// RPC URL override; resolved from the environment when unset
    #[serde(default)]
    pub rpc_url: Option<String>,
    /// Explorer link template, `{tx_id}` is replaced with the signature
    pub explorer_tx_url: String,
}

impl Default for SolanaSettings {
    fn default() -> Self {
        Self {
            rpc_url: None,
            explorer_tx_url: DEFAULT_EXPLORER_TX_URL.to_string(),
        }
    }
}

impl SolanaSettings {
    /// RPC endpoint: explicit setting, else the environment
    pub fn rpc(&self) -> RpcConfig {
        match &self.rpc_url {
            Some(url) if !url.trim().is_empty() => RpcConfig::with_url(url.clone()),
            _ => RpcConfig::from_env(),
        }
    }
}

/// Token handling defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSettings {
    /// Decimals assumed when a token has no known metadata
    pub default_decimals: u8,
    /// Slippage percent used when a caller does not specify one
    pub default_slippage_percent: String,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            default_decimals: crate::tokens::DEFAULT_DECIMALS,
            default_slippage_percent: "0.5".to_string(),
        }
    }
}

/// Risk management configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Maximum slippage tolerance (e.g., 1.0 for 1%)
    pub max_slippage_percent: f64,
    /// Minimum seconds between swaps
    pub cooldown_seconds: u64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_slippage_percent: 5.0,
            cooldown_seconds: 0,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub okx: OkxSettings,
    #[serde(default)]
    pub solana: SolanaSettings,
    #[serde(default)]
    pub tokens: TokenSettings,
    /// Risk management settings
    #[serde(default)]
    pub risk: RiskConfig,
    /// Per-request timeout for upstream HTTP calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Path to audit log file; `null` disables auditing
    #[serde(default = "default_audit_log_path")]
    pub audit_log_path: Option<String>,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_audit_log_path() -> Option<String> {
    Some(DEFAULT_AUDIT_LOG_PATH.to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            okx: OkxSettings::default(),
            solana: SolanaSettings::default(),
            tokens: TokenSettings::default(),
            risk: RiskConfig::default(),
            request_timeout_secs: default_request_timeout_secs(),
            audit_log_path: default_audit_log_path(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(raw)
            .map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the rest of the crate cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.tokens.default_decimals > crate::tokens::MAX_DECIMALS {
            return Err(Error::Config(format!(
                "tokens.default_decimals must be <= {}",
                crate::tokens::MAX_DECIMALS
            )));
        }
        if self.okx.chain_id.trim().is_empty() {
            return Err(Error::Config("okx.chain_id must not be empty".to_string()));
        }
        if url::Url::parse(&self.okx.base_url).is_err() {
            return Err(Error::Config(format!(
                "okx.base_url is not a valid URL: {}",
                self.okx.base_url
            )));
        }
        if !self.risk.max_slippage_percent.is_finite() || self.risk.max_slippage_percent < 0.0 {
            return Err(Error::Config(
                "risk.max_slippage_percent must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    /// Wallet private key from the first populated wallet env var
    pub fn wallet_key_from_env() -> Option<String> {
        WALLET_KEY_ENVS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_deserialize_defaults() {
        let parsed = Config::from_json("{}").expect("parse config");
        assert_eq!(parsed.okx.base_url, "https://www.okx.com");
        assert_eq!(parsed.okx.chain_id, "501");
        assert_eq!(parsed.tokens.default_decimals, 9);
        assert_eq!(parsed.tokens.default_slippage_percent, "0.5");
        assert_eq!(parsed.request_timeout_secs, 30);
        assert_eq!(parsed.audit_log_path, Config::default().audit_log_path);
        assert_eq!(parsed.audit_log_path.as_deref(), Some(DEFAULT_AUDIT_LOG_PATH));
        assert_eq!(parsed.solana.explorer_tx_url, DEFAULT_EXPLORER_TX_URL);

        let disabled = Config::from_json(r#"{"audit_log_path": null}"#).expect("parse config");
        assert!(disabled.audit_log_path.is_none());
    }

    #[test]
    fn config_deserialize_explicit() {
        let value = serde_json::json!({
            "okx": { "base_url": "https://example.test", "chain_id": "501" },
            "solana": {
                "rpc_url": "https://rpc.test",
                "explorer_tx_url": "https://explorer.test/tx/{tx_id}"
            },
            "tokens": { "default_decimals": 6, "default_slippage_percent": "1" },
            "risk": { "max_slippage_percent": 2.5, "cooldown_seconds": 60 },
            "request_timeout_secs": 10,
            "audit_log_path": "audit.jsonl"
        });
        let parsed = Config::from_json(&value.to_string()).expect("parse config");
        assert_eq!(parsed.tokens.default_decimals, 6);
        assert_eq!(parsed.risk.cooldown_seconds, 60);
        assert_eq!(parsed.solana.explorer_tx_url, "https://explorer.test/tx/{tx_id}");
        assert_eq!(parsed.audit_log_path.as_deref(), Some("audit.jsonl"));
        assert_eq!(parsed.solana.rpc().url(), "https://rpc.test");
    }

    #[test]
    fn config_rejects_decimals_out_of_range() {
        let result = Config::from_json(r#"{"tokens": {"default_decimals": 19, "default_slippage_percent": "0.5"}}"#);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn config_rejects_bad_base_url() {
        let result = Config::from_json(r#"{"okx": {"base_url": "not a url", "chain_id": "501"}}"#);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn default_explorer_template() {
        let config = Config::default();
        assert_eq!(config.solana.explorer_tx_url, DEFAULT_EXPLORER_TX_URL);
        assert!(config.solana.explorer_tx_url.contains("{tx_id}"));
    }
}
