// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Embed/extract pipeline.
//!
//! Nothing is written into the cover. Embedding walks the cover's 8×8 blocks
//! in row-major order and, for each block:
//! 1. derives the permutation key Q from the first row (and correspondent key)
//! 2. computes the 21 hierarchical averages
//! 3. reorders them with Q in three rounds of 7
//! 4. takes the MSB of each reordered value
//! 5. maps the next payload bit against each MSB to produce one Z-code bit
//!
//! until the payload runs out, possibly in the middle of a block. Extraction
//! recomputes the same MSBs from the cover and inverts step 5.
//!
//! Steps 1-4 only depend on one block and the key, so with the `parallel`
//! feature they run on the rayon pool. Step 5 is a sequential zip.

use tracing::{debug, trace, warn};

use crate::stego::averages::{hierarchical_averages, msb};
use crate::stego::capacity::capacity;
use crate::stego::error::StegoError;
use crate::stego::mapping::{map_from_z, map_to_z};
use crate::stego::payload::{
    self, DecodeAmbiguity, ImageDecode, ImageHeader, Secret, SecretType,
};
use crate::stego::permute::{apply_q_three_rounds, derive_q, KeyShuffle};
use crate::stego::raster::Raster;
use crate::stego::{validate_cover_dimensions, AVERAGES_PER_BLOCK};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Summary of an embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedInfo {
    pub secret_type: SecretType,
    /// Payload length in bits, marker included. Equals the Z-code length.
    pub payload_bits: usize,
    /// Character count of a text secret.
    pub text_chars: Option<usize>,
    /// Header written for an image secret.
    pub image: Option<ImageHeader>,
}

/// Result of [`embed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embedding {
    /// One bit per payload bit, in block-then-position order.
    pub zcode: Vec<u8>,
    /// Capacity of the cover in bits.
    pub capacity: usize,
    pub info: EmbedInfo,
}

/// Summary of an extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractInfo {
    pub secret_type: SecretType,
    /// Recovered marker bit (never ciphered).
    pub type_marker: u8,
    /// Recovered payload bits, marker included.
    pub total_bits: usize,
    /// Recovered bits after the marker.
    pub content_bits: usize,
    /// Character count of a text secret.
    pub text_chars: Option<usize>,
    /// Size of the returned image (64×64 for the noise placeholder).
    pub image_dims: Option<(u32, u32)>,
    pub is_color: Option<bool>,
    /// Set when image bits could not be decoded and the noise placeholder
    /// was returned instead.
    pub fallback: Option<DecodeAmbiguity>,
}

/// Result of [`extract`] and [`detect_and_extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub secret: Secret,
    pub info: ExtractInfo,
}

/// Validate the cover and collapse it to luminance.
fn prepare_cover(cover: &Raster) -> Result<Raster, StegoError> {
    validate_cover_dimensions(cover.width(), cover.height())?;
    Ok(cover.to_luma())
}

/// The 21 MSBs of the Q-permuted averages of block `idx` (row-major).
fn block_msbs(gray: &Raster, shuffle: Option<&KeyShuffle>, idx: usize) -> [u8; AVERAGES_PER_BLOCK] {
    let bw = gray.blocks_wide();
    let block = gray.block(idx / bw, idx % bw);
    let q = derive_q(&block, shuffle);
    let averages = hierarchical_averages(&block);
    let permuted = apply_q_three_rounds(&averages, &q);
    trace!(block = idx, ?q, "block statistics");
    permuted.map(msb)
}

/// The first `n_bits` MSBs of the cover, walking blocks in row-major order.
///
/// Only the blocks needed for `n_bits` are computed. `n_bits` must not
/// exceed the cover capacity.
fn msb_stream(gray: &Raster, shuffle: Option<&KeyShuffle>, n_bits: usize) -> Vec<u8> {
    let total_blocks = gray.blocks_wide() * gray.blocks_tall();
    let blocks = n_bits.div_ceil(AVERAGES_PER_BLOCK).min(total_blocks);
    let compute = |idx: usize| block_msbs(gray, shuffle, idx);

    #[cfg(feature = "parallel")]
    let per_block: Vec<[u8; AVERAGES_PER_BLOCK]> = (0..blocks).into_par_iter().map(compute).collect();
    #[cfg(not(feature = "parallel"))]
    let per_block: Vec<[u8; AVERAGES_PER_BLOCK]> = (0..blocks).map(compute).collect();

    let mut msbs: Vec<u8> = per_block.into_iter().flatten().collect();
    msbs.truncate(n_bits);
    msbs
}

/// Embed `secret` against `cover`, producing the Z-code.
///
/// `key` is the optional correspondent key; `None` and `Some("")` are
/// equivalent. The cover is only read.
///
/// # Errors
/// - [`StegoError::InvalidDimensions`] if the cover is not a multiple of 8.
/// - [`StegoError::CapacityExceeded`] if the payload does not fit.
/// - [`StegoError::ImageTooLarge`] if an image secret side exceeds 65535.
/// - [`StegoError::EmptyImage`] if an image secret has zero width or height.
pub fn embed(cover: &Raster, secret: &Secret, key: Option<&str>) -> Result<Embedding, StegoError> {
    let gray = prepare_cover(cover)?;
    let capacity = capacity(gray.width(), gray.height());

    let (payload, header) = payload::serialize_secret(secret)?;
    if payload.len() > capacity {
        return Err(StegoError::CapacityExceeded { required: payload.len(), capacity });
    }

    let encrypted = payload::cipher_payload(&payload, key);
    let shuffle = KeyShuffle::from_key(key);
    let msbs = msb_stream(&gray, shuffle.as_ref(), encrypted.len());
    let zcode: Vec<u8> = encrypted.iter().zip(&msbs).map(|(&m, &s)| map_to_z(m, s)).collect();

    debug!(
        width = gray.width(),
        height = gray.height(),
        capacity,
        payload_bits = payload.len(),
        secret_type = %secret.secret_type(),
        keyed = shuffle.is_some(),
        "embedded secret"
    );

    Ok(Embedding {
        zcode,
        capacity,
        info: EmbedInfo {
            secret_type: secret.secret_type(),
            payload_bits: payload.len(),
            text_chars: secret.as_text().map(|t| t.chars().count()),
            image: header,
        },
    })
}

/// Invert the mapping and the cipher: Z-code -> plaintext payload bits.
fn recover_payload(cover: &Raster, zcode: &[u8], key: Option<&str>) -> Result<Vec<u8>, StegoError> {
    let gray = prepare_cover(cover)?;
    if zcode.is_empty() {
        return Err(StegoError::TruncatedZcode { available: 0, required: 1 });
    }

    let capacity = capacity(gray.width(), gray.height());
    let usable = zcode.len().min(capacity);
    if usable < zcode.len() {
        debug!(zcode_bits = zcode.len(), capacity, "Z-code longer than cover capacity, ignoring the tail");
    }

    let shuffle = KeyShuffle::from_key(key);
    let msbs = msb_stream(&gray, shuffle.as_ref(), usable);
    let encrypted: Vec<u8> = zcode[..usable].iter().zip(&msbs).map(|(&z, &s)| map_from_z(z, s)).collect();
    Ok(payload::cipher_payload(&encrypted, key))
}

/// Decode recovered payload bits as `secret_type`.
fn decode_payload(payload: &[u8], secret_type: SecretType) -> Extraction {
    let type_marker = payload[0] & 1;
    let content = &payload[1..];
    let mut info = ExtractInfo {
        secret_type,
        type_marker,
        total_bits: payload.len(),
        content_bits: content.len(),
        text_chars: None,
        image_dims: None,
        is_color: None,
        fallback: None,
    };

    let secret = match secret_type {
        SecretType::Text => {
            let text = payload::deserialize_text(content);
            info.text_chars = Some(text.chars().count());
            Secret::Text(text)
        }
        SecretType::Image => {
            let decoded = payload::deserialize_image(content);
            if let ImageDecode::Fallback { reason, .. } = &decoded {
                warn!(%reason, content_bits = content.len(), "image payload undecodable, returning noise placeholder");
                info.fallback = Some(*reason);
            }
            let img = decoded.into_image();
            info.image_dims = Some((img.width(), img.height()));
            info.is_color = Some(img.layout().is_color());
            Secret::Image(img)
        }
    };

    debug!(total_bits = info.total_bits, %secret_type, type_marker, "extracted secret");
    Extraction { secret, info }
}

/// Recover a secret of the given type from `cover` and `zcode`.
///
/// Z-code bits beyond the cover capacity are ignored. A wrong key is not
/// detected: text comes back garbled and images fall back to the noise
/// placeholder (see [`ExtractInfo::fallback`]).
///
/// # Errors
/// - [`StegoError::InvalidDimensions`] if the cover is not a multiple of 8.
/// - [`StegoError::TruncatedZcode`] if `zcode` is empty.
pub fn extract(
    cover: &Raster,
    zcode: &[u8],
    secret_type: SecretType,
    key: Option<&str>,
) -> Result<Extraction, StegoError> {
    let payload = recover_payload(cover, zcode, key)?;
    Ok(decode_payload(&payload, secret_type))
}

/// Like [`extract`], but decodes according to the recovered type marker.
pub fn detect_and_extract(cover: &Raster, zcode: &[u8], key: Option<&str>) -> Result<Extraction, StegoError> {
    let payload = recover_payload(cover, zcode, key)?;
    let secret_type = SecretType::from_marker(payload[0]);
    Ok(decode_payload(&payload, secret_type))
}
