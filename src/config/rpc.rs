//! Solana RPC endpoint configuration
//!
//! Supports multiple configuration methods following Solana ecosystem conventions:
//! 1. `SOLANA_RPC_URL` - highest priority
//! 2. `RPC_URL` - generic override shared with other tooling
//! 3. Provider API key (`HELIUS_API_KEY`) - builds the URL automatically
//! 4. Public mainnet RPC fallback - for testing only
//!
//! # Examples
//!
//! ```bash
//! # Option 1: Explicit URL (recommended for production)
//! export SOLANA_RPC_URL="https://mainnet.helius-rpc.com/?api-key=YOUR_KEY"
//!
//! # Option 2: Provider API key
//! export HELIUS_API_KEY="YOUR_KEY"
//!
//! # Option 3: No env vars - uses the public RPC (rate limited, for testing only)
//! ```

/// Where the RPC URL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcSource {
    SolanaRpcUrl,
    RpcUrl,
    Helius,
    Public,
    Explicit,
}

/// Solana RPC configuration
#[derive(Debug, Clone)]
pub struct RpcConfig {
    url: String,
    source: RpcSource,
}

/// Environment variable names
mod env_vars {
    pub const SOLANA_RPC_URL: &str = "SOLANA_RPC_URL";
    pub const RPC_URL: &str = "RPC_URL";
    pub const HELIUS_API_KEY: &str = "HELIUS_API_KEY";
}

/// Public RPC endpoint (rate limited, for testing only)
pub const PUBLIC_MAINNET_RPC: &str = "https://api.mainnet-beta.solana.com";

impl RpcConfig {
    /// Create RPC config from environment variables
    ///
    /// Priority:
    /// 1. SOLANA_RPC_URL
    /// 2. RPC_URL
    /// 3. HELIUS_API_KEY - builds the Helius mainnet URL
    /// 4. Public mainnet RPC (for testing only)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve the RPC URL through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(url) = non_empty(env_vars::SOLANA_RPC_URL) {
            tracing::debug!("Using SOLANA_RPC_URL");
            return Self {
                url,
                source: RpcSource::SolanaRpcUrl,
            };
        }

        if let Some(url) = non_empty(env_vars::RPC_URL) {
            tracing::debug!("Using RPC_URL");
            return Self {
                url,
                source: RpcSource::RpcUrl,
            };
        }

        if let Some(key) = non_empty(env_vars::HELIUS_API_KEY) {
            tracing::info!("Building RPC URL from HELIUS_API_KEY");
            return Self {
                url: format!("https://mainnet.helius-rpc.com/?api-key={}", key),
                source: RpcSource::Helius,
            };
        }

        tracing::warn!("No Solana RPC configured, using public RPC (rate limited)");
        Self {
            url: PUBLIC_MAINNET_RPC.to_string(),
            source: RpcSource::Public,
        }
    }

    /// Create with an explicit RPC URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source: RpcSource::Explicit,
        }
    }

    /// RPC URL
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn source(&self) -> RpcSource {
        self.source
    }

    /// True when the URL is the rate-limited public fallback
    pub fn is_public(&self) -> bool {
        self.source == RpcSource::Public
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
