//! Shared token registry
//!
//! Centralizes Solana token metadata (mint addresses, decimals, symbols) so the
//! DEX client, swap executor and front-ends agree on how amounts are scaled
//! and displayed.
//!
//! The registry is pre-seeded with the well-known mints and grows as quotes
//! and token listings reveal more metadata. It is owned by whoever builds the
//! client and shared through an `Arc`; there is no process-global instance.

use crate::amount;
use crate::{Error, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Highest decimal count the registry will store
pub const MAX_DECIMALS: u8 = 18;

/// Decimals assumed for tokens with no known metadata
pub const DEFAULT_DECIMALS: u8 = 9;

/// Chain identifiers used by the aggregator API
pub mod chains {
    pub const SOLANA: &str = "501";
}

/// Well-known Solana mint addresses
pub mod addresses {
    /// Wrapped SOL mint
    pub const WRAPPED_SOL: &str = "So11111111111111111111111111111111111111112";
    /// System-program sentinel the aggregator uses for native SOL
    pub const NATIVE_SOL: &str = "11111111111111111111111111111111";
    pub const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
    pub const USDT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";
}

/// Token metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Token symbol (e.g., "SOL", "USDC"); may be empty for unlisted mints
    pub symbol: String,
    /// Mint address (base58)
    pub address: String,
    /// Number of decimals
    pub decimals: u8,
}

impl TokenInfo {
    pub fn new(symbol: impl Into<String>, address: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            address: address.into(),
            decimals,
        }
    }

    /// Build from upstream metadata where decimals arrive as a string
    pub fn from_upstream(symbol: &str, address: &str, decimals: &str) -> Result<Self> {
        let parsed: u8 = decimals.trim().parse().map_err(|_| {
            Error::Upstream(format!(
                "token {} reported non-numeric decimals '{}'",
                address, decimals
            ))
        })?;
        Ok(Self::new(symbol, address, parsed))
    }
}

/// True when `value` decodes as a 32-byte base58 Solana address
pub fn is_valid_address(value: &str) -> bool {
    (32..=44).contains(&value.len())
        && bs58::decode(value)
            .into_vec()
            .map(|bytes| bytes.len() == 32)
            .unwrap_or(false)
}

/// Rewrite the wrapped-SOL mint to the native sentinel for swap requests
///
/// Every other address passes through unchanged.
pub fn normalize_swap_address(address: &str) -> &str {
    if address == addresses::WRAPPED_SOL {
        addresses::NATIVE_SOL
    } else {
        address
    }
}

fn seed_tokens() -> Vec<TokenInfo> {
    vec![
        TokenInfo::new("SOL", addresses::WRAPPED_SOL, 9),
        TokenInfo::new("USDC", addresses::USDC, 6),
        TokenInfo::new("USDT", addresses::USDT, 6),
    ]
}

/// Token registry providing metadata lookups by mint address
pub struct TokenRegistry {
    tokens: RwLock<HashMap<String, TokenInfo>>,
    default_decimals: u8,
}

impl TokenRegistry {
    /// Create a registry seeded with SOL, USDC and USDT
    pub fn new() -> Self {
        Self::with_default_decimals(DEFAULT_DECIMALS)
    }

    /// Seeded registry with a custom fallback decimal count
    pub fn with_default_decimals(default_decimals: u8) -> Self {
        let tokens = seed_tokens()
            .into_iter()
            .map(|info| (info.address.clone(), info))
            .collect();

        Self {
            tokens: RwLock::new(tokens),
            default_decimals: default_decimals.min(MAX_DECIMALS),
        }
    }

    /// Get token info by mint address
    pub fn get(&self, address: &str) -> Option<TokenInfo> {
        self.tokens.read().get(address).cloned()
    }

    /// Decimals for a mint, falling back to the registry default
    pub fn decimals_for(&self, address: &str) -> u8 {
        self.get(address)
            .map(|info| info.decimals)
            .unwrap_or(self.default_decimals)
    }

    /// Known symbol for a mint, if any
    pub fn symbol_for(&self, address: &str) -> Option<String> {
        self.get(address)
            .map(|info| info.symbol)
            .filter(|symbol| !symbol.is_empty())
    }

    pub fn default_decimals(&self) -> u8 {
        self.default_decimals
    }

    /// Insert or overwrite token metadata (last writer wins)
    ///
    /// # Errors
    /// `InvalidInput` when decimals exceed 18 or the address is empty; the
    /// registry is left untouched.
    pub fn upsert(&self, info: TokenInfo) -> Result<()> {
        if info.decimals > MAX_DECIMALS {
            return Err(Error::InvalidInput(format!(
                "token {} has {} decimals (max {})",
                info.address, info.decimals, MAX_DECIMALS
            )));
        }
        if info.address.trim().is_empty() {
            return Err(Error::InvalidInput("token address is empty".to_string()));
        }

        tracing::debug!(
            address = %info.address,
            symbol = %info.symbol,
            decimals = info.decimals,
            "Token metadata updated"
        );
        self.tokens.write().insert(info.address.clone(), info);
        Ok(())
    }

    /// Resolve a symbol (case-insensitive) or mint address to token info
    ///
    /// Unknown but well-formed addresses resolve with an empty symbol and
    /// the default decimals.
    pub fn resolve(&self, symbol_or_address: &str) -> Result<TokenInfo> {
        let needle = symbol_or_address.trim();

        if let Some(info) = self.get(needle) {
            return Ok(info);
        }

        // Prefer seeded mints when a listing introduced a duplicate symbol
        let seeded = seed_tokens();
        if let Some(info) = seeded
            .iter()
            .find(|info| info.symbol.eq_ignore_ascii_case(needle))
        {
            return Ok(self.get(&info.address).unwrap_or_else(|| info.clone()));
        }

        let by_symbol = self
            .tokens
            .read()
            .values()
            .filter(|info| !info.symbol.is_empty() && info.symbol.eq_ignore_ascii_case(needle))
            .min_by(|a, b| a.address.cmp(&b.address))
            .cloned();
        if let Some(info) = by_symbol {
            return Ok(info);
        }

        if is_valid_address(needle) {
            return Ok(TokenInfo::new("", needle, self.default_decimals));
        }

        Err(Error::UnknownToken(format!(
            "'{}' is not a known symbol or a valid mint address. Known symbols: {}",
            needle,
            self.symbols().join(", ")
        )))
    }

    /// Sorted, de-duplicated list of known symbols
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .tokens
            .read()
            .values()
            .filter(|info| !info.symbol.is_empty())
            .map(|info| info.symbol.clone())
            .collect();
        symbols.sort();
        symbols.dedup();
        symbols
    }

    /// All known tokens, sorted by symbol
    pub fn all(&self) -> Vec<TokenInfo> {
        let mut tokens: Vec<TokenInfo> = self.tokens.read().values().cloned().collect();
        tokens.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.address.cmp(&b.address)));
        tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }

    /// Human-readable amount for a mint using registry metadata
    pub fn display_amount(&self, base_units: &str, address: &str) -> String {
        let symbol = self.symbol_for(address);
        amount::display_amount(
            base_units,
            self.decimals_for(address),
            symbol.as_deref(),
            address,
        )
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}
