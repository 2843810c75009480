// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Coverless MSB steganography.
//!
//! The cover image is never modified. Each 8×8 block yields 21 hierarchical
//! averages whose MSBs, reordered by a content-derived permutation key Q,
//! are compared against the payload bits. The result of the comparison is
//! the Z-code, the only artifact that travels to the receiver. Anyone holding
//! the same cover (and the correspondent key, if one was used) can invert it.
//!
//! - [`embed`] / [`extract`] / [`detect_and_extract`]: the engine
//! - [`carrier`]: packing the Z-code into a text string or a gray image
//! - [`capacity()`]: how many payload bits a cover holds

pub mod error;
pub mod bits;
pub mod raster;
pub mod averages;
pub mod permute;
pub mod mapping;
pub mod crypto;
pub mod payload;
pub mod capacity;
mod pipeline;
pub mod carrier;

pub use error::StegoError;
pub use raster::{Block, PixelLayout, Raster};
pub use payload::{DecodeAmbiguity, ImageDecode, ImageHeader, Secret, SecretType};
pub use pipeline::{detect_and_extract, embed, extract, EmbedInfo, Embedding, ExtractInfo, Extraction};
pub use capacity::{available_cover_sizes, capacity, recommended_cover_size, required_bits};
pub use carrier::{carrier_decode, carrier_encode, CarrierMeta};
pub use crypto::generate_correspondent_key;

/// Side length of a processing block in pixels.
pub const BLOCK_SIZE: usize = 8;

/// Length of the permutation key Q.
pub const Q_LENGTH: usize = 7;

/// Q is applied to the 21 averages in this many rounds of [`Q_LENGTH`].
pub const Q_ROUNDS: usize = 3;

/// Hierarchical averages (and Z-code positions) per block.
pub const AVERAGES_PER_BLOCK: usize = Q_LENGTH * Q_ROUNDS;

/// Image payload header: 16-bit width, 16-bit height, color flag, alpha flag.
pub const IMAGE_HEADER_BITS: usize = 34;

/// Side length of the gray placeholder returned for undecodable image bits.
pub const NOISE_IMAGE_SIZE: u32 = 64;

/// Header of a carrier image: 32-bit length, 8-bit style, 16-bit item,
/// 16-bit size.
pub const CARRIER_HEADER_BITS: usize = 72;

/// Square cover sizes offered to users, smallest first.
pub const COVER_SIZES: [u32; 7] = [64, 128, 256, 512, 1024, 2048, 4096];

/// Validate cover dimensions.
///
/// Both sides must be non-zero multiples of [`BLOCK_SIZE`]. Called at the
/// start of [`embed`] and [`extract`].
///
/// # Errors
/// [`StegoError::InvalidDimensions`] otherwise.
pub fn validate_cover_dimensions(width: u32, height: u32) -> Result<(), StegoError> {
    let block = BLOCK_SIZE as u32;
    if width == 0 || height == 0 || width % block != 0 || height % block != 0 {
        return Err(StegoError::InvalidDimensions { width, height });
    }
    Ok(())
}
