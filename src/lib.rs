// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # cihmsb-core
//!
//! Pure-Rust coverless steganography engine. A text or image secret is
//! hidden "in" an unmodified cover image by deriving a bit stream, the
//! Z-code, from the MSBs of hierarchical block averages:
//!
//! - **Embed**: cover + secret (+ correspondent key) -> Z-code
//! - **Extract**: cover + Z-code (+ correspondent key) -> secret
//! - **Carrier**: Z-code <-> `0`/`1` text or a compact gray image
//!
//! No cover pixel is ever changed; the receiver needs the same cover image
//! and the Z-code. The optional correspondent key reorders the per-block
//! permutation and XORs the payload with a SHA-256 keystream.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use cihmsb_core::{embed, extract, Raster, Secret, SecretType};
//!
//! let cover = Raster::gray(512, 512, pixels).unwrap();
//! let out = embed(&cover, &Secret::Text("meet at noon".into()), Some("k3y")).unwrap();
//! let back = extract(&cover, &out.zcode, SecretType::Text, Some("k3y")).unwrap();
//! assert_eq!(back.secret, Secret::Text("meet at noon".into()));
//! ```

pub mod stego;

pub use stego::{embed, extract, detect_and_extract, Embedding, EmbedInfo, Extraction, ExtractInfo};
pub use stego::{Raster, PixelLayout, Block, Secret, SecretType, ImageHeader, ImageDecode, DecodeAmbiguity};
pub use stego::{capacity, required_bits, recommended_cover_size, available_cover_sizes, COVER_SIZES};
pub use stego::{carrier_encode, carrier_decode, CarrierMeta};
pub use stego::{generate_correspondent_key, validate_cover_dimensions, StegoError};
pub use stego::carrier;
