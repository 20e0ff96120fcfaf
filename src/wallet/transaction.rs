//! Solana wire-format helpers for signing upstream-built transactions
//!
//! Layout: `[num_signatures (compact-u16)] [N x 64 signature slots] [message]`.
//! A v0 message starts with `0x80`; a legacy message starts with its header.

use crate::{Error, Result};

const SIGNATURE_LEN: usize = 64;
const PUBKEY_LEN: usize = 32;
const MESSAGE_HEADER_LEN: usize = 3;

/// Offsets into a serialized transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TransactionLayout {
    pub num_signatures: u16,
    /// Offset of the first signature slot
    pub signatures_offset: usize,
    /// Offset of the message (everything that gets signed)
    pub message_offset: usize,
    pub versioned: bool,
}

impl TransactionLayout {
    pub fn parse(tx_bytes: &[u8]) -> Result<Self> {
        if tx_bytes.is_empty() {
            return Err(Error::Wallet("Empty transaction".to_string()));
        }

        let (num_signatures, header_len) = decode_compact_u16(tx_bytes)?;
        if num_signatures == 0 {
            return Err(Error::Wallet(
                "Transaction has 0 signatures required".to_string(),
            ));
        }

        let message_offset = header_len + num_signatures as usize * SIGNATURE_LEN;
        if message_offset >= tx_bytes.len() {
            return Err(Error::Wallet(format!(
                "Transaction too short: need more than {} bytes for {} signatures, have {}",
                message_offset,
                num_signatures,
                tx_bytes.len()
            )));
        }

        Ok(Self {
            num_signatures,
            signatures_offset: header_len,
            message_offset,
            versioned: tx_bytes[message_offset] & 0x80 != 0,
        })
    }

    pub fn message<'a>(&self, tx_bytes: &'a [u8]) -> &'a [u8] {
        &tx_bytes[self.message_offset..]
    }

    /// First static account key, which pays fees and signs first
    pub fn fee_payer<'a>(&self, tx_bytes: &'a [u8]) -> Result<&'a [u8]> {
        let message = self.message(tx_bytes);
        let header_start = usize::from(self.versioned);
        let keys_len_start = header_start + MESSAGE_HEADER_LEN;

        if message.len() <= keys_len_start {
            return Err(Error::Wallet("Transaction message header truncated".to_string()));
        }

        let (num_keys, len_bytes) = decode_compact_u16(&message[keys_len_start..])?;
        let first_key = keys_len_start + len_bytes;
        if num_keys == 0 || message.len() < first_key + PUBKEY_LEN {
            return Err(Error::Wallet(
                "Transaction message has no account keys".to_string(),
            ));
        }

        Ok(&message[first_key..first_key + PUBKEY_LEN])
    }
}

/// Copy of `tx_bytes` with `signature` in the first slot
pub(crate) fn place_signature(
    tx_bytes: &[u8],
    layout: &TransactionLayout,
    signature: &[u8; 64],
) -> Vec<u8> {
    let mut signed = tx_bytes.to_vec();
    let start = layout.signatures_offset;
    signed[start..start + SIGNATURE_LEN].copy_from_slice(signature);
    signed
}

/// Decode Solana compact-u16 encoding
/// Returns (value, bytes_consumed)
pub(crate) fn decode_compact_u16(data: &[u8]) -> Result<(u16, usize)> {
    let truncated = || Error::Wallet("Truncated compact-u16".to_string());

    let first = *data.first().ok_or_else(truncated)? as u16;
    if first < 0x80 {
        return Ok((first, 1));
    }

    let second = *data.get(1).ok_or_else(truncated)? as u16;
    if second < 0x80 {
        return Ok(((first & 0x7F) | (second << 7), 2));
    }

    let third = *data.get(2).ok_or_else(truncated)? as u16;
    Ok(((first & 0x7F) | ((second & 0x7F) << 7) | (third << 14), 3))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_compact_u16() {
        assert_eq!(decode_compact_u16(&[0x05]).unwrap(), (5, 1));
        assert_eq!(decode_compact_u16(&[0x80, 0x01]).unwrap(), (128, 2));
        assert_eq!(decode_compact_u16(&[0xff, 0xff, 0x03]).unwrap(), (0xffff, 3));
        assert!(decode_compact_u16(&[]).is_err());
        assert!(decode_compact_u16(&[0x80]).is_err());
    }

    #[test]
    fn test_layout_rejects_short_transactions() {
        assert!(TransactionLayout::parse(&[]).is_err());
        assert!(TransactionLayout::parse(&[0]).is_err());
        assert!(TransactionLayout::parse(&[1, 0, 0]).is_err());
    }

    #[test]
    fn test_layout_offsets() {
        let mut tx = vec![2u8];
        tx.extend_from_slice(&[0u8; 128]);
        tx.extend_from_slice(&[0x80, 2, 0, 1]);
        let layout = TransactionLayout::parse(&tx).unwrap();
        assert_eq!(layout.num_signatures, 2);
        assert_eq!(layout.signatures_offset, 1);
        assert_eq!(layout.message_offset, 129);
        assert!(layout.versioned);
    }
}
