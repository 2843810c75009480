// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Per-block permutation key (Q) generation.
//!
//! Q is a permutation of `1..=7` taken from the order statistics of the
//! block's first seven luminance values: `Q[k] = 1 + index of the k-th
//! smallest value`, ties kept in positional order. Encoder and decoder see
//! the same cover, so both derive the same Q without transmitting it.
//!
//! With a correspondent key, Q is further reordered by a key-derived
//! shuffle `S`: `Q'[i] = Q[S[i]]`. `S` comes from a Fisher-Yates shuffle
//! driven by a ChaCha20 PRNG seeded from the first four bytes (big-endian)
//! of SHA-256(key).
//!
//! # Cross-platform portability
//!
//! The Fisher-Yates shuffle uses `u32` for `gen_range` (not `usize`) so the
//! PRNG consumes the same entropy on 32-bit and 64-bit targets.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

use crate::stego::raster::Block;
use crate::stego::{AVERAGES_PER_BLOCK, Q_LENGTH};

/// A 7-element permutation of `1..=7`.
pub type QKey = [u8; Q_LENGTH];

/// Key-derived reordering of the Q positions. Depends only on the
/// correspondent key, so the pipeline derives it once per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyShuffle {
    order: [usize; Q_LENGTH],
}

impl KeyShuffle {
    /// Derive the shuffle for `key`. Empty keys yield `None` (no reordering).
    pub fn from_key(key: Option<&str>) -> Option<Self> {
        let key = key.filter(|k| !k.is_empty())?;
        let digest = Sha256::digest(key.as_bytes());
        let seed = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        Some(Self { order: shuffle_portable(seed) })
    }

    pub fn order(&self) -> &[usize; Q_LENGTH] {
        &self.order
    }

    fn apply(&self, q: &QKey) -> QKey {
        let mut out = [0u8; Q_LENGTH];
        for (dst, &src) in out.iter_mut().zip(self.order.iter()) {
            *dst = q[src];
        }
        out
    }
}

/// Fisher-Yates over `0..Q_LENGTH` using `u32` ranges for portable behavior.
fn shuffle_portable(seed: u32) -> [usize; Q_LENGTH] {
    let mut rng = ChaCha20Rng::seed_from_u64(u64::from(seed));
    let mut order: [usize; Q_LENGTH] = core::array::from_fn(|i| i);
    for i in (1..Q_LENGTH).rev() {
        let j = rng.gen_range(0..=(i as u32)) as usize;
        order.swap(i, j);
    }
    order
}

/// Q from the block content alone (stable argsort of the first row, 1-based).
fn content_q(block: &Block) -> QKey {
    let row = &block.first_row()[..Q_LENGTH];
    let mut idx: [usize; Q_LENGTH] = core::array::from_fn(|i| i);
    // `sort_by_key` is stable, so equal values keep positional order.
    idx.sort_by_key(|&i| row[i]);
    let mut q = [0u8; Q_LENGTH];
    for (dst, &i) in q.iter_mut().zip(idx.iter()) {
        *dst = i as u8 + 1;
    }
    q
}

/// Derive Q for a block with a pre-computed key shuffle.
pub fn derive_q(block: &Block, shuffle: Option<&KeyShuffle>) -> QKey {
    let q = content_q(block);
    match shuffle {
        Some(s) => s.apply(&q),
        None => q,
    }
}

/// Derive Q for a block and an optional correspondent key.
pub fn generate_q(block: &Block, key: Option<&str>) -> QKey {
    derive_q(block, KeyShuffle::from_key(key).as_ref())
}

/// Reorder 7 values by Q: `out[k] = values[Q[k] - 1]`.
pub fn apply_permutation<T: Copy>(values: &[T; Q_LENGTH], q: &QKey) -> [T; Q_LENGTH] {
    core::array::from_fn(|k| values[usize::from(q[k]) - 1])
}

/// Apply Q independently to `values[0..7]`, `values[7..14]` and `values[14..21]`.
pub fn apply_q_three_rounds<T: Copy + Default>(values: &[T; AVERAGES_PER_BLOCK], q: &QKey) -> [T; AVERAGES_PER_BLOCK] {
    let mut out = [T::default(); AVERAGES_PER_BLOCK];
    for (src, dst) in values.chunks_exact(Q_LENGTH).zip(out.chunks_exact_mut(Q_LENGTH)) {
        for (k, slot) in dst.iter_mut().enumerate() {
            *slot = src[usize::from(q[k]) - 1];
        }
    }
    out
}
