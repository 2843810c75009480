// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Correspondent-keyed XOR keystream over payload bits.
//!
//! The keystream is the bit expansion (MSB first) of a SHA-256 hash chain:
//!
//! ```text
//! d0 = SHA-256(key), d1 = SHA-256(d0), d2 = SHA-256(d1), ...
//! keystream = bits(d0) || bits(d1) || ...
//! ```
//!
//! This hides payload content from anyone holding the cover and Z-code but
//! not the key. It is not authenticated encryption: a wrong key produces
//! garbled content rather than an error.

use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Length of a generated correspondent key in random bytes (hex doubles it).
pub const CORRESPONDENT_KEY_BYTES: usize = 16;

/// Build `len` keystream bits for `key`.
fn keystream(key: &str, len: usize) -> Zeroizing<Vec<u8>> {
    let mut bits = Zeroizing::new(Vec::with_capacity(len + 256));
    let mut digest = Zeroizing::new([0u8; 32]);
    digest.copy_from_slice(&Sha256::digest(key.as_bytes()));
    while bits.len() < len {
        for &byte in digest.iter() {
            for bit_pos in (0..8).rev() {
                bits.push((byte >> bit_pos) & 1);
            }
        }
        let next = Sha256::digest(&digest[..]);
        digest.copy_from_slice(&next);
    }
    bits.truncate(len);
    bits
}

/// XOR `bits` with the keystream for `key`.
///
/// `None` and the empty key are an explicit no-op. Applying the function
/// twice with the same key returns the input.
pub fn xor_cipher(bits: &[u8], key: Option<&str>) -> Vec<u8> {
    let key = match key {
        Some(k) if !k.is_empty() => k,
        _ => return bits.to_vec(),
    };
    let stream = keystream(key, bits.len());
    bits.iter().zip(stream.iter()).map(|(&b, &k)| (b ^ k) & 1).collect()
}

/// Generate a fresh correspondent key: 32 lowercase hex characters.
pub fn generate_correspondent_key() -> String {
    let mut rng = rand::thread_rng();
    let mut raw = Zeroizing::new([0u8; CORRESPONDENT_KEY_BYTES]);
    rng.fill_bytes(&mut *raw);
    raw.iter().map(|b| format!("{b:02x}")).collect()
}
