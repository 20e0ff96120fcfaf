//! Secure wallet management
//!
//! This module handles private key storage and transaction signing.
//! The private key NEVER leaves this module.

mod signer;
mod transaction;

pub use signer::SecureWallet;

#[cfg(test)]
pub(crate) use signer::tests::{test_keypair_b58, unsigned_transaction};
