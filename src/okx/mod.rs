//! OKX DEX aggregator API
//!
//! Request signing, the HTTP transport seam, typed response shapes and the
//! client that ties them together.

mod client;
pub mod signer;
pub mod transport;
pub mod types;

pub use client::{endpoints, OkxDexClient, API_PREFIX};
pub use signer::{HttpMethod, SignedRequestContext};
pub use transport::{ApiRequest, HttpTransport, ReqwestTransport};
pub use types::{
    ChainData, LiquiditySource, QuoteData, QuoteRequest, QuoteToken, RouteQuote, Slippage,
    SwapData, SwapTx, SwapTxRequest, TokenListing,
};
