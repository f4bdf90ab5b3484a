//! Alphabet cipher used by the legacy text feed.
//!
//! A 22-symbol token over a 64-symbol alphabet packs 33 hex nibbles, three
//! per symbol pair. Bit 3 of the last symbol selects one of two nibble
//! layouts; the 33rd nibble only carries that bit and is discarded.

use log::trace;

use crate::avtrdb::types::error::{AvtrdbError, Result};
use crate::avtrdb::types::models::AvatarId;

/// Symbol alphabet. Indices 0..16 double as the lowercase hex digits.
pub const ALPHABET: &[u8; 64] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ+=";

/// Number of symbols in a token.
pub const TOKEN_LEN: usize = 22;

/// Index of a symbol in [`ALPHABET`].
fn symbol_index(symbol: u8) -> Option<u8> {
    match symbol {
        b'0'..=b'9' => Some(symbol - b'0'),
        b'a'..=b'z' => Some(symbol - b'a' + 10),
        b'A'..=b'Z' => Some(symbol - b'A' + 36),
        b'+' => Some(62),
        b'=' => Some(63),
        _ => None,
    }
}

fn hex_digit(nibble: u8) -> char {
    ALPHABET[(nibble & 15) as usize] as char
}

/// Decodes a legacy token (already un-reversed) into an avatar id.
///
/// Only the first [`TOKEN_LEN`] symbols are read.
pub fn decode_token(token: &str) -> Result<AvatarId> {
    let invalid = |reason| AvtrdbError::InvalidToken {
        token: token.to_string(),
        reason,
    };

    let bytes = token.as_bytes();
    if bytes.len() < TOKEN_LEN {
        return Err(invalid("shorter than 22 symbols"));
    }
    let mut indices = [0u8; TOKEN_LEN];
    for (slot, &symbol) in indices.iter_mut().zip(bytes) {
        *slot = symbol_index(symbol).ok_or_else(|| invalid("symbol outside the cipher alphabet"))?;
    }

    let format = (indices[21] >> 2) & 2;
    trace!("Decoding legacy token with nibble layout {}", format);

    let mut digits = String::with_capacity(33);
    for pair in indices.chunks_exact(2) {
        let (first, third) = (pair[0], pair[1]);
        let second = if format == 0 {
            (first >> 2) & 12
        } else {
            (first & 3) << 2
        };
        digits.push(hex_digit(first >> format));
        digits.push(hex_digit(second | ((third >> 4) & 3)));
        digits.push(hex_digit(third));
    }
    digits.pop();

    Ok(AvatarId::from_hex_digits(&digits))
}
