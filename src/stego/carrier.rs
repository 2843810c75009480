// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Carrier codec: packing a Z-code into a transportable artifact.
//!
//! Three forms are supported:
//!
//! - **Text**: one `'0'`/`'1'` character per bit.
//! - **Header image**: a gray image whose pixels are the bytes of
//!   `header || zcode`, with a 72-bit header
//!
//!   ```text
//!   [32 bits] Z-code bit length (BE)
//!   [ 8 bits] style id
//!   [16 bits] item id (BE)
//!   [16 bits] cover size (BE)
//!   ```
//!
//! - **Header-less image**: the same packing without the header; the bit
//!   length travels out of band.
//!
//! Packed images are as square as possible: `width = floor(sqrt(n))`,
//! `height = ceil(n / width)` for `n` bytes, remaining pixels zero.
//!
//! The text envelope `"{style}-{item}-{size}|{bits}"` bundles the text form
//! with the same metadata.

use core::fmt;

use tracing::debug;

use crate::stego::bits::{bits_to_bytes, bits_to_uint, bytes_to_bits, push_uint};
use crate::stego::error::StegoError;
use crate::stego::raster::{PixelLayout, Raster};
use crate::stego::CARRIER_HEADER_BITS;

/// Style id assumed by envelopes that only carry `{item}-{size}`.
pub const DEFAULT_STYLE_ID: u8 = 1;

/// Metadata stored next to a Z-code: which cover the receiver should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CarrierMeta {
    pub style_id: u8,
    pub item_id: u16,
    /// Side length of the square cover.
    pub size: u16,
}

impl fmt::Display for CarrierMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.style_id, self.item_id, self.size)
    }
}

// --- text form ---

/// Render bits as a `'0'`/`'1'` string.
pub fn zcode_to_text(zcode: &[u8]) -> String {
    zcode.iter().map(|&b| if b & 1 == 1 { '1' } else { '0' }).collect()
}

/// Parse a `'0'`/`'1'` string. Surrounding whitespace is ignored.
///
/// # Errors
/// [`StegoError::InvalidCarrier`] on any other character.
pub fn text_to_zcode(text: &str) -> Result<Vec<u8>, StegoError> {
    text.trim()
        .char_indices()
        .map(|(i, c)| match c {
            '0' => Ok(0),
            '1' => Ok(1),
            other => Err(StegoError::InvalidCarrier(format!("unexpected {other:?} at position {i}"))),
        })
        .collect()
}

// --- image forms ---

fn isqrt(n: usize) -> usize {
    let mut r = (n as f64).sqrt() as usize;
    while r * r > n {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= n {
        r += 1;
    }
    r
}

/// Pack bits (zero-padded to a byte) into a near-square gray raster.
fn pack_bits(bits: &[u8]) -> Raster {
    let mut bytes = bits_to_bytes(bits);
    let n = bytes.len();
    if n == 0 {
        return Raster::filled(0, 0, PixelLayout::Gray, 0);
    }
    let width = isqrt(n);
    let height = n.div_ceil(width);
    bytes.resize(width * height, 0);
    Raster::gray_from_fn(width as u32, height as u32, |i| bytes[i])
}

/// All bits of a carrier image, after collapsing it to gray.
fn unpack_bits(img: &Raster) -> Vec<u8> {
    match img.layout() {
        PixelLayout::Gray => bytes_to_bits(img.data()),
        _ => bytes_to_bits(img.to_luma().data()),
    }
}

/// Pack a Z-code into an image without a header.
///
/// An empty Z-code produces a 0×0 image.
pub fn zcode_to_image(zcode: &[u8]) -> Raster {
    pack_bits(zcode)
}

/// Unpack a header-less carrier image. With `bit_len`, the result is cut to
/// that many bits; otherwise the zero padding is returned as well.
pub fn image_to_zcode(img: &Raster, bit_len: Option<usize>) -> Vec<u8> {
    let mut bits = unpack_bits(img);
    if let Some(len) = bit_len {
        bits.truncate(len);
    }
    bits
}

/// Pack a Z-code and its metadata into a header image.
///
/// # Errors
/// [`StegoError::CapacityExceeded`] if the Z-code is longer than the 32-bit
/// length field allows.
pub fn carrier_encode(zcode: &[u8], meta: CarrierMeta) -> Result<Raster, StegoError> {
    let len = u32::try_from(zcode.len())
        .map_err(|_| StegoError::CapacityExceeded { required: zcode.len(), capacity: u32::MAX as usize })?;

    let mut bits = Vec::with_capacity(CARRIER_HEADER_BITS + zcode.len());
    push_uint(&mut bits, u64::from(len), 32);
    push_uint(&mut bits, u64::from(meta.style_id), 8);
    push_uint(&mut bits, u64::from(meta.item_id), 16);
    push_uint(&mut bits, u64::from(meta.size), 16);
    bits.extend(zcode.iter().map(|&b| b & 1));

    let img = pack_bits(&bits);
    debug!(zcode_bits = zcode.len(), %meta, width = img.width(), height = img.height(), "packed carrier image");
    Ok(img)
}

/// Unpack a header image produced by [`carrier_encode`].
///
/// Color images are collapsed to luminance first.
///
/// # Errors
/// [`StegoError::TruncatedZcode`] if the image is shorter than the header,
/// or the header declares zero bits or more bits than the image holds.
pub fn carrier_decode(img: &Raster) -> Result<(Vec<u8>, CarrierMeta), StegoError> {
    let bits = unpack_bits(img);
    if bits.len() < CARRIER_HEADER_BITS {
        return Err(StegoError::TruncatedZcode { available: bits.len(), required: CARRIER_HEADER_BITS });
    }

    let len = bits_to_uint(&bits[0..32]) as usize;
    let meta = CarrierMeta {
        style_id: bits_to_uint(&bits[32..40]) as u8,
        item_id: bits_to_uint(&bits[40..56]) as u16,
        size: bits_to_uint(&bits[56..72]) as u16,
    };

    let available = bits.len() - CARRIER_HEADER_BITS;
    if len == 0 || len > available {
        return Err(StegoError::TruncatedZcode { available, required: len.max(1) });
    }

    let zcode = bits[CARRIER_HEADER_BITS..CARRIER_HEADER_BITS + len].to_vec();
    Ok((zcode, meta))
}

// --- text envelope ---

/// `"{style}-{item}-{size}|{bits}"`.
pub fn encode_envelope(zcode: &[u8], meta: CarrierMeta) -> String {
    format!("{meta}|{}", zcode_to_text(zcode))
}

/// Parse an envelope. The legacy `"{item}-{size}|{bits}"` form is accepted
/// with [`DEFAULT_STYLE_ID`].
///
/// # Errors
/// [`StegoError::InvalidCarrier`] on a missing `|`, a malformed or
/// out-of-range number, or a bad bit character.
pub fn decode_envelope(envelope: &str) -> Result<(Vec<u8>, CarrierMeta), StegoError> {
    let (header, body) = envelope
        .trim()
        .split_once('|')
        .ok_or_else(|| StegoError::InvalidCarrier("envelope has no '|' separator".into()))?;

    let fields: Vec<&str> = header.split('-').collect();
    let meta = match fields.as_slice() {
        [style, item, size] => CarrierMeta {
            style_id: parse_field(style, "style")?,
            item_id: parse_field(item, "item")?,
            size: parse_field(size, "size")?,
        },
        [item, size] => CarrierMeta {
            style_id: DEFAULT_STYLE_ID,
            item_id: parse_field(item, "item")?,
            size: parse_field(size, "size")?,
        },
        _ => return Err(StegoError::InvalidCarrier(format!("malformed envelope header {header:?}"))),
    };

    Ok((text_to_zcode(body)?, meta))
}

fn parse_field<T: core::str::FromStr>(raw: &str, name: &str) -> Result<T, StegoError> {
    raw.trim()
        .parse()
        .map_err(|_| StegoError::InvalidCarrier(format!("bad {name} field {raw:?}")))
}
