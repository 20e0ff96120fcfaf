//! OKX DEX plugin
//!
//! Exposes the OKX DEX aggregator on Solana as agent actions:
//! - Quotes, liquidity sources, supported chains and token listings
//! - Swaps, signed locally and broadcast over Solana JSON-RPC
//! - Human ⇄ base-unit amount conversion for SPL tokens
//!
//! # Security Model
//!
//! - Every request is HMAC-signed; credentials are checked before any I/O
//! - All action calls pass through the interceptor pipeline
//! - Private keys never leave the Rust wallet module
//! - Full audit trail of all operations

pub mod actions;
pub mod amount;
pub mod config;
pub mod interceptors;
pub mod okx;
pub mod runner;
pub mod swap;
pub mod tokens;
pub mod wallet;

mod error;

// Re-export commonly used types
pub use actions::{ActionContext, ActionKind, ActionRequest, ActionResponse, OkxDexPlugin};
pub use config::{ApiCredentials, Config, RpcConfig};
pub use error::{Error, Result};
pub use okx::{OkxDexClient, Slippage};
pub use runner::TradingBot;
pub use swap::{SwapExecutor, SwapResult};
pub use tokens::{TokenInfo, TokenRegistry};
