// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Capacity arithmetic.
//!
//! Every whole 8×8 block of the cover yields [`AVERAGES_PER_BLOCK`] (21)
//! Z-code positions, so a W×H cover carries `floor(W/8) * floor(H/8) * 21`
//! payload bits. The payload includes the 1-bit type marker and, for images,
//! the 34-bit header.

use crate::stego::error::StegoError;
use crate::stego::payload::Secret;
use crate::stego::{AVERAGES_PER_BLOCK, BLOCK_SIZE, COVER_SIZES, IMAGE_HEADER_BITS};

/// Payload capacity in bits of a `width` x `height` cover.
pub fn capacity(width: u32, height: u32) -> usize {
    (width as usize / BLOCK_SIZE) * (height as usize / BLOCK_SIZE) * AVERAGES_PER_BLOCK
}

/// Exact payload length (marker included) that [`embed`](crate::stego::embed)
/// will produce for `secret`.
///
/// # Errors
/// - [`StegoError::ImageTooLarge`] if an image side exceeds 65535.
/// - [`StegoError::EmptyImage`] if an image side is zero.
pub fn required_bits(secret: &Secret) -> Result<usize, StegoError> {
    match secret {
        Secret::Text(text) => Ok(1 + text.len() * 8),
        Secret::Image(img) => {
            if img.width() == 0 || img.height() == 0 {
                return Err(StegoError::EmptyImage { width: img.width(), height: img.height() });
            }
            if img.width() > u32::from(u16::MAX) || img.height() > u32::from(u16::MAX) {
                return Err(StegoError::ImageTooLarge { width: img.width(), height: img.height() });
            }
            Ok(1 + IMAGE_HEADER_BITS + img.pixel_count() * img.layout().bits_per_pixel())
        }
    }
}

/// Square cover sizes from [`COVER_SIZES`] whose capacity holds `bits`.
pub fn available_cover_sizes(bits: usize) -> Vec<u32> {
    COVER_SIZES.iter().copied().filter(|&s| capacity(s, s) >= bits).collect()
}

/// Smallest square cover size that holds `bits`, or the largest known size
/// if none does.
pub fn recommended_cover_size(bits: usize) -> u32 {
    COVER_SIZES
        .iter()
        .copied()
        .find(|&s| capacity(s, s) >= bits)
        .unwrap_or(COVER_SIZES[COVER_SIZES.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stego::raster::{PixelLayout, Raster};

    #[test]
    fn capacity_formula() {
        assert_eq!(capacity(512, 512), 86_016);
        assert_eq!(capacity(8, 8), 21);
        assert_eq!(capacity(64, 8), 8 * 21);
        // partial blocks do not count
        assert_eq!(capacity(15, 15), 21);
        assert_eq!(capacity(7, 100), 0);
    }

    #[test]
    fn required_bits_matches_layout() {
        assert_eq!(required_bits(&Secret::Text("H".into())).unwrap(), 9);
        assert_eq!(required_bits(&Secret::Text("日".into())).unwrap(), 25);
        let img = Raster::filled(4, 2, PixelLayout::Rgba, 0);
        assert_eq!(required_bits(&Secret::Image(img)).unwrap(), 1 + 34 + 8 * 32);
        let big = Raster::filled(65_536, 1, PixelLayout::Gray, 0);
        assert!(required_bits(&Secret::Image(big)).is_err());
        let empty = Raster::filled(0, 4, PixelLayout::Rgb, 0);
        assert_eq!(
            required_bits(&Secret::Image(empty)),
            Err(StegoError::EmptyImage { width: 0, height: 4 })
        );
    }

    #[test]
    fn recommended_size_is_smallest_fit() {
        assert_eq!(recommended_cover_size(1), 64);
        assert_eq!(recommended_cover_size(capacity(64, 64)), 64);
        assert_eq!(recommended_cover_size(capacity(64, 64) + 1), 128);
        assert_eq!(recommended_cover_size(usize::MAX), 4096);
    }

    #[test]
    fn available_sizes_filter() {
        assert_eq!(available_cover_sizes(86_016), vec![512, 1024, 2048, 4096]);
        assert!(available_cover_sizes(usize::MAX).is_empty());
    }
}
