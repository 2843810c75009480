// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Secret payload serialization.
//!
//! The payload is a bit string:
//!
//! ```text
//! [1 bit  ] type marker (0 = text, 1 = image)
//! text:  [8 bits per UTF-8 byte]
//! image: [16 bits] width (BE)
//!        [16 bits] height (BE)
//!        [1 bit  ] is_color
//!        [1 bit  ] has_alpha
//!        [8 bits per channel per pixel] row-major, channels R,G,B(,A) or gray
//! ```
//!
//! Before embedding, the content is XORed with the correspondent keystream.
//! The marker and the 34-bit image header stay in the clear, so a receiver
//! holding the wrong key still learns the payload type and image shape.
//!
//! Image decoding never fails: bits that cannot describe an image produce a
//! deterministic 64×64 gray placeholder, reported as [`ImageDecode::Fallback`].

use core::fmt;

use crate::stego::bits::{bits_to_text, bits_to_uint, bytes_to_bits, push_uint, text_to_bits};
use crate::stego::crypto::xor_cipher;
use crate::stego::error::StegoError;
use crate::stego::raster::{PixelLayout, Raster};
use crate::stego::{IMAGE_HEADER_BITS, NOISE_IMAGE_SIZE};

/// Type marker value for text payloads.
pub const TYPE_MARKER_TEXT: u8 = 0;
/// Type marker value for image payloads.
pub const TYPE_MARKER_IMAGE: u8 = 1;

/// Kind of secret carried by a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretType {
    Text,
    Image,
}

impl SecretType {
    pub fn marker(self) -> u8 {
        match self {
            Self::Text => TYPE_MARKER_TEXT,
            Self::Image => TYPE_MARKER_IMAGE,
        }
    }

    pub fn from_marker(bit: u8) -> Self {
        if bit & 1 == TYPE_MARKER_IMAGE {
            Self::Image
        } else {
            Self::Text
        }
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Image => f.write_str("image"),
        }
    }
}

/// A secret to embed, or the result of an extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Secret {
    Text(String),
    Image(Raster),
}

impl Secret {
    pub fn secret_type(&self) -> SecretType {
        match self {
            Self::Text(_) => SecretType::Text,
            Self::Image(_) => SecretType::Image,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            Self::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&Raster> {
        match self {
            Self::Image(img) => Some(img),
            Self::Text(_) => None,
        }
    }
}

/// The 34-bit image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u16,
    pub height: u16,
    pub is_color: bool,
    pub has_alpha: bool,
}

impl ImageHeader {
    fn for_raster(img: &Raster) -> Result<Self, StegoError> {
        if img.width() == 0 || img.height() == 0 {
            return Err(StegoError::EmptyImage { width: img.width(), height: img.height() });
        }
        let too_large = || StegoError::ImageTooLarge { width: img.width(), height: img.height() };
        Ok(Self {
            width: u16::try_from(img.width()).map_err(|_| too_large())?,
            height: u16::try_from(img.height()).map_err(|_| too_large())?,
            is_color: img.layout().is_color(),
            has_alpha: img.layout().has_alpha(),
        })
    }

    fn push_bits(&self, out: &mut Vec<u8>) {
        push_uint(out, u64::from(self.width), 16);
        push_uint(out, u64::from(self.height), 16);
        out.push(u8::from(self.is_color));
        out.push(u8::from(self.has_alpha));
    }

    /// Parse the first 34 bits. `None` if fewer are available.
    pub fn parse(bits: &[u8]) -> Option<Self> {
        if bits.len() < IMAGE_HEADER_BITS {
            return None;
        }
        Some(Self {
            width: bits_to_uint(&bits[0..16]) as u16,
            height: bits_to_uint(&bits[16..32]) as u16,
            is_color: bits[32] & 1 == 1,
            has_alpha: bits[33] & 1 == 1,
        })
    }

    /// Pixel layout named by the mode bits; `None` for alpha without color.
    pub fn layout(&self) -> Option<PixelLayout> {
        match (self.is_color, self.has_alpha) {
            (false, false) => Some(PixelLayout::Gray),
            (true, false) => Some(PixelLayout::Rgb),
            (true, true) => Some(PixelLayout::Rgba),
            (false, true) => None,
        }
    }
}

/// Why image bits could not be decoded as declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeAmbiguity {
    /// Fewer than 34 bits, so no header.
    MissingHeader { available: usize },
    /// Header declares a zero width or height.
    ZeroDimension { width: u16, height: u16 },
    /// Header sets `has_alpha` on a gray image.
    AlphaWithoutColor,
    /// Fewer pixel bits than the header declares.
    TruncatedPixels { required: usize, available: usize },
}

impl fmt::Display for DecodeAmbiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader { available } => {
                write!(f, "only {available} bits, image header needs {IMAGE_HEADER_BITS}")
            }
            Self::ZeroDimension { width, height } => write!(f, "header declares empty image {width}x{height}"),
            Self::AlphaWithoutColor => f.write_str("header sets alpha on a gray image"),
            Self::TruncatedPixels { required, available } => {
                write!(f, "pixel data needs {required} bits, got {available} (wrong key?)")
            }
        }
    }
}

/// Outcome of decoding image payload bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageDecode {
    Decoded(Raster),
    /// The bits did not describe an image; `noise` is the deterministic
    /// placeholder built from them.
    Fallback { noise: Raster, reason: DecodeAmbiguity },
}

impl ImageDecode {
    pub fn image(&self) -> &Raster {
        match self {
            Self::Decoded(img) => img,
            Self::Fallback { noise, .. } => noise,
        }
    }

    pub fn into_image(self) -> Raster {
        match self {
            Self::Decoded(img) => img,
            Self::Fallback { noise, .. } => noise,
        }
    }

    pub fn fallback_reason(&self) -> Option<DecodeAmbiguity> {
        match self {
            Self::Decoded(_) => None,
            Self::Fallback { reason, .. } => Some(*reason),
        }
    }
}

/// Text content bits: UTF-8 bytes, MSB first.
pub fn serialize_text(text: &str) -> Vec<u8> {
    text_to_bits(text)
}

/// Decode text content bits; lossy on invalid UTF-8, never fails.
pub fn deserialize_text(bits: &[u8]) -> String {
    bits_to_text(bits)
}

/// Image content bits: the 34-bit header followed by packed pixels.
///
/// # Errors
/// - [`StegoError::ImageTooLarge`] if a dimension exceeds 65535.
/// - [`StegoError::EmptyImage`] if a dimension is zero.
pub fn serialize_image(img: &Raster) -> Result<(Vec<u8>, ImageHeader), StegoError> {
    let header = ImageHeader::for_raster(img)?;
    let mut bits = Vec::with_capacity(IMAGE_HEADER_BITS + img.data().len() * 8);
    header.push_bits(&mut bits);
    bits.extend(bytes_to_bits(img.data()));
    Ok((bits, header))
}

/// Decode image content bits (header + pixels).
///
/// Trailing bits beyond the declared pixel count are ignored.
pub fn deserialize_image(bits: &[u8]) -> ImageDecode {
    match try_deserialize_image(bits) {
        Ok(img) => ImageDecode::Decoded(img),
        Err(reason) => ImageDecode::Fallback { noise: noise_image(bits), reason },
    }
}

fn try_deserialize_image(bits: &[u8]) -> Result<Raster, DecodeAmbiguity> {
    let header = ImageHeader::parse(bits).ok_or(DecodeAmbiguity::MissingHeader { available: bits.len() })?;
    if header.width == 0 || header.height == 0 {
        return Err(DecodeAmbiguity::ZeroDimension { width: header.width, height: header.height });
    }
    let layout = header.layout().ok_or(DecodeAmbiguity::AlphaWithoutColor)?;

    let pixel_bits = &bits[IMAGE_HEADER_BITS..];
    let byte_len = usize::from(header.width) * usize::from(header.height) * layout.channels();
    let required = byte_len * 8;
    if pixel_bits.len() < required {
        return Err(DecodeAmbiguity::TruncatedPixels { required, available: pixel_bits.len() });
    }

    let data = pixel_bits[..required]
        .chunks_exact(8)
        .map(|byte| bits_to_uint(byte) as u8)
        .collect();
    Raster::new(u32::from(header.width), u32::from(header.height), layout, data)
        .map_err(|_| DecodeAmbiguity::TruncatedPixels { required, available: pixel_bits.len() })
}

/// The 64×64 gray placeholder for undecodable image bits.
///
/// Pixel `i` (row-major) is `bits[i] * 255` while bits remain, 128 after.
pub fn noise_image(bits: &[u8]) -> Raster {
    Raster::gray_from_fn(NOISE_IMAGE_SIZE, NOISE_IMAGE_SIZE, |i| {
        bits.get(i).map_or(128, |&b| (b & 1) * 255)
    })
}

/// Serialize a secret into its full payload: type marker + content bits.
///
/// Returns the payload and, for images, the header that was written.
pub fn serialize_secret(secret: &Secret) -> Result<(Vec<u8>, Option<ImageHeader>), StegoError> {
    match secret {
        Secret::Text(text) => {
            let content = serialize_text(text);
            let mut bits = Vec::with_capacity(1 + content.len());
            bits.push(TYPE_MARKER_TEXT);
            bits.extend(content);
            Ok((bits, None))
        }
        Secret::Image(img) => {
            let (content, header) = serialize_image(img)?;
            let mut bits = Vec::with_capacity(1 + content.len());
            bits.push(TYPE_MARKER_IMAGE);
            bits.extend(content);
            Ok((bits, Some(header)))
        }
    }
}

/// Number of leading payload bits that bypass the cipher: the marker, plus
/// the image header when the marker says image.
pub fn clear_prefix_len(payload: &[u8]) -> usize {
    match payload.first() {
        None => 0,
        Some(&m) if SecretType::from_marker(m) == SecretType::Image => {
            1 + IMAGE_HEADER_BITS.min(payload.len() - 1)
        }
        Some(_) => 1,
    }
}

/// Apply the keystream to the ciphered part of a payload.
///
/// The split is read from the marker bit, which is never ciphered, so the
/// same call encrypts on embed and decrypts on extract.
pub fn cipher_payload(payload: &[u8], key: Option<&str>) -> Vec<u8> {
    let clear = clear_prefix_len(payload);
    let mut out = Vec::with_capacity(payload.len());
    out.extend_from_slice(&payload[..clear]);
    out.extend(xor_cipher(&payload[clear..], key));
    out
}

/// Downsample `img` (nearest neighbour) so its payload fits in `capacity`
/// bits.
///
/// Images that already fit are returned unchanged. Otherwise each side is
/// scaled by `sqrt(max_pixels / pixels)` and rounded down to a multiple of 8
/// (at least 8), which may still exceed a very small capacity.
pub fn fit_image_to_capacity(img: &Raster, capacity: usize) -> Raster {
    let bpp = img.layout().bits_per_pixel();
    let max_pixels = capacity.saturating_sub(1 + IMAGE_HEADER_BITS) / bpp;
    let pixels = img.pixel_count();
    let fits_header = img.width() <= u32::from(u16::MAX) && img.height() <= u32::from(u16::MAX);
    if pixels <= max_pixels && fits_header {
        return img.clone();
    }

    let ratio = (max_pixels as f64 / pixels as f64).sqrt();
    let scale = |dim: u32| -> u32 {
        let scaled = ((f64::from(dim) * ratio) as u32 / 8) * 8;
        scaled.clamp(8, u32::from(u16::MAX) / 8 * 8)
    };
    let (new_w, new_h) = (scale(img.width()), scale(img.height()));
    tracing::debug!(
        from_w = img.width(),
        from_h = img.height(),
        new_w,
        new_h,
        capacity,
        "downsampling secret image to fit cover"
    );
    resize_nearest(img, new_w, new_h)
}

fn resize_nearest(img: &Raster, new_w: u32, new_h: u32) -> Raster {
    let ch = img.layout().channels();
    let mut data = Vec::with_capacity(new_w as usize * new_h as usize * ch);
    for y in 0..new_h {
        let sy = (u64::from(y) * u64::from(img.height()) / u64::from(new_h)) as u32;
        for x in 0..new_w {
            let sx = (u64::from(x) * u64::from(img.width()) / u64::from(new_w)) as u32;
            data.extend_from_slice(img.pixel(sx, sy));
        }
    }
    Raster::new(new_w, new_h, img.layout(), data).unwrap_or_else(|_| Raster::filled(new_w, new_h, img.layout(), 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_2x1() -> Raster {
        Raster::new(2, 1, PixelLayout::Rgb, vec![255, 0, 0, 1, 2, 3]).unwrap()
    }

    #[test]
    fn image_header_layout() {
        let (bits, header) = serialize_image(&rgb_2x1()).unwrap();
        assert_eq!(header, ImageHeader { width: 2, height: 1, is_color: true, has_alpha: false });
        assert_eq!(bits.len(), IMAGE_HEADER_BITS + 2 * 24);
        assert_eq!(bits_to_uint(&bits[0..16]), 2);
        assert_eq!(bits_to_uint(&bits[16..32]), 1);
        assert_eq!(&bits[32..34], &[1, 0]);
        // first channel byte: R = 255
        assert_eq!(&bits[34..42], &[1; 8]);
    }

    #[test]
    fn image_roundtrip_all_layouts() {
        let gray = Raster::gray(3, 2, vec![0, 50, 100, 150, 200, 250]).unwrap();
        let rgba = Raster::new(1, 2, PixelLayout::Rgba, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        for img in [gray, rgb_2x1(), rgba] {
            let (bits, _) = serialize_image(&img).unwrap();
            assert_eq!(deserialize_image(&bits), ImageDecode::Decoded(img));
        }
    }

    #[test]
    fn oversize_image_rejected() {
        let img = Raster::filled(70_000, 1, PixelLayout::Gray, 0);
        assert!(matches!(serialize_image(&img), Err(StegoError::ImageTooLarge { width: 70_000, height: 1 })));
    }

    #[test]
    fn zero_sided_image_rejected() {
        for (w, h) in [(0, 0), (0, 5), (7, 0)] {
            let img = Raster::filled(w, h, PixelLayout::Gray, 0);
            assert_eq!(serialize_image(&img), Err(StegoError::EmptyImage { width: w, height: h }));
            assert!(serialize_secret(&Secret::Image(img)).is_err());
        }
    }

    #[test]
    fn missing_header_falls_back() {
        let bits = vec![1, 0, 1];
        let out = deserialize_image(&bits);
        assert_eq!(out.fallback_reason(), Some(DecodeAmbiguity::MissingHeader { available: 3 }));
        let noise = out.image();
        assert_eq!((noise.width(), noise.height()), (64, 64));
        assert_eq!(noise.layout(), PixelLayout::Gray);
        assert_eq!(&noise.data()[..4], &[255, 0, 255, 128]);
        assert!(noise.data()[3..].iter().all(|&p| p == 128));
    }

    #[test]
    fn truncated_pixels_fall_back() {
        let (mut bits, _) = serialize_image(&rgb_2x1()).unwrap();
        bits.truncate(bits.len() - 1);
        let out = deserialize_image(&bits);
        assert_eq!(
            out.fallback_reason(),
            Some(DecodeAmbiguity::TruncatedPixels { required: 48, available: 47 })
        );
        let expected: Vec<u8> = bits.iter().map(|&b| b * 255).collect();
        assert_eq!(&out.image().data()[..bits.len()], &expected[..]);
    }

    #[test]
    fn inconsistent_modes_fall_back() {
        let mut bits = Vec::new();
        ImageHeader { width: 1, height: 1, is_color: false, has_alpha: true }.push_bits(&mut bits);
        bits.extend([0u8; 8]);
        assert_eq!(deserialize_image(&bits).fallback_reason(), Some(DecodeAmbiguity::AlphaWithoutColor));

        let mut bits = Vec::new();
        ImageHeader { width: 0, height: 5, is_color: false, has_alpha: false }.push_bits(&mut bits);
        assert_eq!(
            deserialize_image(&bits).fallback_reason(),
            Some(DecodeAmbiguity::ZeroDimension { width: 0, height: 5 })
        );
    }

    #[test]
    fn trailing_bits_ignored() {
        let img = Raster::gray(1, 1, vec![42]).unwrap();
        let (mut bits, _) = serialize_image(&img).unwrap();
        bits.extend([1, 1, 1]);
        assert_eq!(deserialize_image(&bits), ImageDecode::Decoded(img));
    }

    #[test]
    fn noise_image_long_input() {
        let bits: Vec<u8> = (0..5000).map(|i| (i % 2) as u8).collect();
        let noise = noise_image(&bits);
        assert_eq!(noise.data().len(), 4096);
        assert_eq!(&noise.data()[..3], &[0, 255, 0]);
        assert!(noise_image(&[]).data().iter().all(|&p| p == 128));
    }

    #[test]
    fn secret_payload_has_marker() {
        let (bits, header) = serialize_secret(&Secret::Text("H".into())).unwrap();
        assert_eq!(bits, vec![0, 0, 1, 0, 0, 1, 0, 0, 0]);
        assert!(header.is_none());

        let (bits, header) = serialize_secret(&Secret::Image(rgb_2x1())).unwrap();
        assert_eq!(bits[0], 1);
        assert_eq!(bits.len(), 1 + 34 + 48);
        assert!(header.is_some());
    }

    #[test]
    fn cipher_leaves_marker_and_header_clear() {
        let (payload, _) = serialize_secret(&Secret::Image(rgb_2x1())).unwrap();
        let enc = cipher_payload(&payload, Some("k"));
        assert_eq!(&enc[..35], &payload[..35]);
        assert_ne!(&enc[35..], &payload[35..]);
        assert_eq!(cipher_payload(&enc, Some("k")), payload);

        let (payload, _) = serialize_secret(&Secret::Text("hello".into())).unwrap();
        let enc = cipher_payload(&payload, Some("k"));
        assert_eq!(enc[0], 0);
        assert_ne!(&enc[1..], &payload[1..]);
        assert_eq!(cipher_payload(&enc, Some("k")), payload);
    }

    #[test]
    fn short_image_payload_keeps_partial_header_clear() {
        let payload = vec![1, 0, 1, 1];
        assert_eq!(clear_prefix_len(&payload), 4);
        assert_eq!(cipher_payload(&payload, Some("k")), payload);
        assert_eq!(clear_prefix_len(&[]), 0);
    }

    #[test]
    fn text_roundtrip_and_lossy() {
        assert_eq!(deserialize_text(&serialize_text("héllo")), "héllo");
        assert_eq!(deserialize_text(&bytes_to_bits(&[0xC3])), "\u{FFFD}");
    }

    #[test]
    fn fit_leaves_small_images_alone() {
        let img = Raster::filled(8, 8, PixelLayout::Gray, 9);
        assert_eq!(fit_image_to_capacity(&img, 1 + 34 + 64 * 8), img);
    }

    #[test]
    fn fit_downsamples_to_multiple_of_eight() {
        let data: Vec<u8> = (0..64 * 64).map(|i| (i % 251) as u8).collect();
        let img = Raster::gray(64, 64, data).unwrap();
        // room for 1024 gray pixels -> 32x32
        let out = fit_image_to_capacity(&img, 1 + 34 + 1024 * 8);
        assert_eq!((out.width(), out.height()), (32, 32));
        assert_eq!(out.pixel(0, 0), img.pixel(0, 0));
        assert_eq!(out.pixel(1, 1), img.pixel(2, 2));
        let (payload, _) = serialize_secret(&Secret::Image(out)).unwrap();
        assert!(payload.len() <= 1 + 34 + 1024 * 8);
    }
}
