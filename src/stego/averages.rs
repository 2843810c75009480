// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Three-layer block statistics.
//!
//! An 8×8 block reduces to 21 values:
//!
//! ```text
//! layer 1: 16 means of the 2x2 sub-blocks (4x4 grid, row-major)
//! layer 2:  4 means of 2x2 groups of layer-1 means (2x2 grid, row-major)
//! layer 3:  1 mean of the 4 layer-2 means
//! ```
//!
//! Layers 2 and 3 are computed from the unrounded means of the layer below.
//! Truncation to integers happens only when the 21 outputs are materialized.

use crate::stego::raster::Block;
use crate::stego::AVERAGES_PER_BLOCK;

/// Unrounded per-layer means of one block.
#[derive(Debug, Clone, Copy)]
struct LayerMeans {
    layer1: [[f64; 4]; 4],
    layer2: [[f64; 2]; 2],
    layer3: f64,
}

fn layer_means(block: &Block) -> LayerMeans {
    let mut layer1 = [[0.0f64; 4]; 4];
    for (r, row) in layer1.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            let sum = u32::from(block.get(2 * r, 2 * c))
                + u32::from(block.get(2 * r, 2 * c + 1))
                + u32::from(block.get(2 * r + 1, 2 * c))
                + u32::from(block.get(2 * r + 1, 2 * c + 1));
            *cell = f64::from(sum) / 4.0;
        }
    }

    let mut layer2 = [[0.0f64; 2]; 2];
    for (r, row) in layer2.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = (layer1[2 * r][2 * c]
                + layer1[2 * r][2 * c + 1]
                + layer1[2 * r + 1][2 * c]
                + layer1[2 * r + 1][2 * c + 1])
                / 4.0;
        }
    }

    let layer3 = (layer2[0][0] + layer2[0][1] + layer2[1][0] + layer2[1][1]) / 4.0;

    LayerMeans { layer1, layer2, layer3 }
}

/// Compute the 21 hierarchical averages of a block, in the fixed order
/// `[layer1 x16, layer2 x4, layer3 x1]`, each truncated toward zero.
pub fn hierarchical_averages(block: &Block) -> [u8; AVERAGES_PER_BLOCK] {
    let means = layer_means(block);
    let mut out = [0u8; AVERAGES_PER_BLOCK];
    let flat = means
        .layer1
        .iter()
        .flatten()
        .chain(means.layer2.iter().flatten())
        .chain(core::iter::once(&means.layer3));
    for (dst, &m) in out.iter_mut().zip(flat) {
        // Means of u8 values are in [0, 255], so the cast only truncates.
        *dst = m as u8;
    }
    out
}

/// MSB of an averaged value: 1 iff `value >= 128`.
pub fn msb(value: u8) -> u8 {
    value >> 7
}
