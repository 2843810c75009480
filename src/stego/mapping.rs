// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! MSB mapping between payload bits and Z-code bits.
//!
//! ```text
//! (M, MSB) -> Z        (Z, MSB) -> M
//! (0, 0)   -> 1        (1, 0)   -> 0
//! (0, 1)   -> 0        (0, 0)   -> 1
//! (1, 0)   -> 0        (1, 1)   -> 1
//! (1, 1)   -> 1        (0, 1)   -> 0
//! ```
//!
//! Both directions are XNOR, so each is the other's inverse for a fixed MSB.

/// Map a secret bit to a Z-code bit: 1 iff `secret_bit == msb`.
#[inline]
pub fn map_to_z(secret_bit: u8, msb: u8) -> u8 {
    !(secret_bit ^ msb) & 1
}

/// Recover a secret bit from a Z-code bit: 1 iff `z_bit == msb`.
#[inline]
pub fn map_from_z(z_bit: u8, msb: u8) -> u8 {
    !(z_bit ^ msb) & 1
}
