// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for the embedding engine and carrier codec.
//!
//! [`StegoError`] covers the fatal failure modes. Malformed image payloads
//! are not errors: they resolve to
//! [`ImageDecode::Fallback`](crate::stego::payload::ImageDecode::Fallback).

use core::fmt;

/// Errors that can occur during embedding, extraction or carrier decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StegoError {
    /// The cover width or height is zero or not a multiple of 8.
    InvalidDimensions { width: u32, height: u32 },
    /// The payload needs more bits than the cover provides.
    CapacityExceeded { required: usize, capacity: usize },
    /// Not enough Z-code bits to read the type marker or the carrier header,
    /// or the carrier header declares more bits than are present.
    TruncatedZcode { available: usize, required: usize },
    /// A pixel buffer does not match `width * height * channels`.
    InvalidRaster { expected: usize, actual: usize },
    /// A secret image dimension does not fit the 16-bit header field.
    ImageTooLarge { width: u32, height: u32 },
    /// A secret image has zero width or height.
    EmptyImage { width: u32, height: u32 },
    /// A text carrier contains something other than `0`/`1`, or a text
    /// envelope is malformed.
    InvalidCarrier(String),
}

impl fmt::Display for StegoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { width, height } => {
                write!(f, "cover size must be a non-zero multiple of 8, got {width}x{height}")
            }
            Self::CapacityExceeded { required, capacity } => {
                write!(f, "secret needs {required} bits but the cover holds only {capacity}")
            }
            Self::TruncatedZcode { available, required } => {
                write!(f, "Z-code too short: {available} bits available, {required} required")
            }
            Self::InvalidRaster { expected, actual } => {
                write!(f, "pixel buffer has {actual} bytes, expected {expected}")
            }
            Self::ImageTooLarge { width, height } => {
                write!(f, "secret image {width}x{height} exceeds 65535px per side")
            }
            Self::EmptyImage { width, height } => write!(f, "secret image {width}x{height} has no pixels"),
            Self::InvalidCarrier(msg) => write!(f, "invalid carrier: {msg}"),
        }
    }
}

impl std::error::Error for StegoError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_numbers() {
        let e = StegoError::CapacityExceeded { required: 100, capacity: 21 };
        assert_eq!(e.to_string(), "secret needs 100 bits but the cover holds only 21");

        let e = StegoError::InvalidDimensions { width: 10, height: 8 };
        assert!(e.to_string().contains("10x8"));

        let e = StegoError::EmptyImage { width: 0, height: 5 };
        assert_eq!(e.to_string(), "secret image 0x5 has no pixels");
    }
}
