// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Bit vector conversions.
//!
//! Bits are stored one per `u8` (values 0 or 1). Every multi-bit field in the
//! payload and carrier formats is written most-significant bit first.

/// Convert bytes to a bit vector (MSB first within each byte).
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for bit_pos in (0..8).rev() {
            bits.push((byte >> bit_pos) & 1);
        }
    }
    bits
}

/// Convert a bit vector (MSB first) back to bytes.
/// Pads the last byte with zero bits if `bits.len()` is not a multiple of 8.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(bits.len().div_ceil(8));
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            byte |= (bit & 1) << (7 - i);
        }
        bytes.push(byte);
    }
    bytes
}

/// Like [`bits_to_bytes`] but drops a trailing partial byte.
pub fn bits_to_whole_bytes(bits: &[u8]) -> Vec<u8> {
    let whole = bits.len() - bits.len() % 8;
    bits_to_bytes(&bits[..whole])
}

/// Append the low `width` bits of `value` to `out`, MSB first.
pub fn push_uint(out: &mut Vec<u8>, value: u64, width: usize) {
    debug_assert!(width <= 64);
    for bit_pos in (0..width).rev() {
        out.push(((value >> bit_pos) & 1) as u8);
    }
}

/// Fixed-width big-endian bit expansion of `value`.
pub fn uint_to_bits(value: u64, width: usize) -> Vec<u8> {
    let mut bits = Vec::with_capacity(width);
    push_uint(&mut bits, value, width);
    bits
}

/// Read an MSB-first bit slice (at most 64 bits) as an unsigned integer.
pub fn bits_to_uint(bits: &[u8]) -> u64 {
    debug_assert!(bits.len() <= 64);
    bits.iter().fold(0u64, |acc, &b| (acc << 1) | u64::from(b & 1))
}

/// UTF-8 encode `text` and expand every byte into 8 bits.
pub fn text_to_bits(text: &str) -> Vec<u8> {
    bytes_to_bits(text.as_bytes())
}

/// Regroup bits into bytes and decode them as UTF-8.
///
/// Never fails: invalid sequences become U+FFFD and a trailing partial byte
/// is ignored.
pub fn bits_to_text(bits: &[u8]) -> String {
    String::from_utf8_lossy(&bits_to_whole_bytes(bits)).into_owned()
}
