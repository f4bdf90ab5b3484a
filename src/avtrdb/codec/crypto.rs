//! XOR stream decoding of container identifier blocks.
//!
//! Each container carries 16 random bytes. XORed with the fixed
//! [`STATIC_KEY`] they give the file's dynamic key, which unkeys every
//! 16-byte identifier block with one of two schedules:
//! - Simple: byte-wise XOR
//! - Feedback: descending XOR chain over the in-progress block, then reversed

use log::trace;

use crate::avtrdb::types::models::{AvatarId, KeySchedule};

/// Key table shared by every container across all platforms.
pub const STATIC_KEY: [u8; 16] = [
    208, 29, 107, 36, 251, 69, 122, 14, 67, 204, 171, 246, 106, 38, 183, 224,
];

/// Size of one identifier block in bytes.
pub const BLOCK_LEN: usize = 16;

/// Derives a file's dynamic key from its header random bytes.
pub fn derive_dynamic_key(random_bytes: &[u8; 16], static_key: &[u8; 16]) -> [u8; 16] {
    trace!("Deriving dynamic key from header random bytes");
    xor_simple(random_bytes, static_key)
}

/// Byte-wise XOR of a block against a key. Self-inverse.
pub fn xor_simple(block: &[u8; 16], key: &[u8; 16]) -> [u8; 16] {
    let mut out = [0u8; 16];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = block[i] ^ key[i];
    }
    out
}

/// Feedback XOR, applied in place.
///
/// Runs from index 15 down to 0. Each byte is XORed with its left
/// neighbour (wrapping) and the key byte. Index 0 wraps to index 15, which
/// has already been rewritten by then, so order matters.
pub fn xor_feedback(block: &mut [u8; 16], key: &[u8; 16]) {
    for i in (0..BLOCK_LEN).rev() {
        block[i] ^= block[(i + BLOCK_LEN - 1) % BLOCK_LEN] ^ key[i];
    }
}

/// Recovers the avatar id held in one identifier block.
pub fn decode_block(block: &[u8; 16], key: &[u8; 16], schedule: KeySchedule) -> AvatarId {
    let bytes = match schedule {
        KeySchedule::Simple => xor_simple(block, key),
        KeySchedule::Feedback => {
            let mut bytes = *block;
            xor_feedback(&mut bytes, key);
            bytes.reverse();
            bytes
        }
    };
    AvatarId::from_hex_digits(&hex::encode(bytes))
}
