//! Minimal ABI word encoding for clear-value blobs.
//!
//! The reveal protocol carries decrypted values as a sequence of 32-byte
//! big-endian words; the gateway encodes them and the ledger decodes the
//! word for the record being finalized.

use alloy_primitives::Bytes;

pub const WORD_SIZE: usize = 32;

/// Encode integers as consecutive 32-byte big-endian words.
pub fn encode_words(values: &[u64]) -> Bytes {
    let mut out = Vec::with_capacity(values.len() * WORD_SIZE);
    for value in values {
        let mut word = [0u8; WORD_SIZE];
        word[WORD_SIZE - 8..].copy_from_slice(&value.to_be_bytes());
        out.extend_from_slice(&word);
    }
    Bytes::from(out)
}

/// Decode the first word of a clear-value blob.
pub fn decode_first_word(blob: &Bytes) -> Option<u64> {
    if blob.len() < WORD_SIZE {
        return None;
    }
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&blob[WORD_SIZE - 8..WORD_SIZE]);
    Some(u64::from_be_bytes(raw))
}
