// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Pixel grids for cover images, secret images and carrier images.
//!
//! A [`Raster`] is an interleaved 8-bit buffer in row-major order. Covers may
//! be any layout; they are collapsed to luminance before block processing.

use crate::stego::error::StegoError;
use crate::stego::BLOCK_SIZE;

/// Channel layout of a [`Raster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    Gray,
    Rgb,
    Rgba,
}

impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    pub fn is_color(self) -> bool {
        !matches!(self, Self::Gray)
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba)
    }

    /// Bits needed to serialize one pixel.
    pub fn bits_per_pixel(self) -> usize {
        self.channels() * 8
    }
}

/// An 8-bit image buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    layout: PixelLayout,
    data: Vec<u8>,
}

impl Raster {
    /// Wrap an interleaved buffer, checking its length.
    pub fn new(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> Result<Self, StegoError> {
        let expected = width as usize * height as usize * layout.channels();
        if data.len() != expected {
            return Err(StegoError::InvalidRaster { expected, actual: data.len() });
        }
        Ok(Self { width, height, layout, data })
    }

    pub fn gray(width: u32, height: u32, data: Vec<u8>) -> Result<Self, StegoError> {
        Self::new(width, height, PixelLayout::Gray, data)
    }

    /// A raster with every channel set to `value`.
    pub fn filled(width: u32, height: u32, layout: PixelLayout, value: u8) -> Self {
        let len = width as usize * height as usize * layout.channels();
        Self { width, height, layout, data: vec![value; len] }
    }

    /// A gray raster whose pixel `i` (row-major) is `f(i)`.
    pub fn gray_from_fn(width: u32, height: u32, f: impl FnMut(usize) -> u8) -> Self {
        let data = (0..width as usize * height as usize).map(f).collect();
        Self { width, height, layout: PixelLayout::Gray, data }
    }

    /// Build a gray raster from nested rows. All rows must have equal length.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, StegoError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(width * height);
        for row in rows {
            data.extend_from_slice(row.as_ref());
        }
        Self::gray(width as u32, height as u32, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Channels of the pixel at (x, y).
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let ch = self.layout.channels();
        let start = (y as usize * self.width as usize + x as usize) * ch;
        &self.data[start..start + ch]
    }

    /// Collapse to one luminance channel: `trunc(0.299R + 0.587G + 0.114B)`.
    ///
    /// Alpha is ignored. A gray raster is returned as a plain copy.
    pub fn to_luma(&self) -> Raster {
        let data = match self.layout {
            PixelLayout::Gray => self.data.clone(),
            PixelLayout::Rgb | PixelLayout::Rgba => self
                .data
                .chunks_exact(self.layout.channels())
                .map(|px| luma(px[0], px[1], px[2]))
                .collect(),
        };
        Raster { width: self.width, height: self.height, layout: PixelLayout::Gray, data }
    }

    /// Number of whole 8×8 blocks horizontally.
    pub fn blocks_wide(&self) -> usize {
        self.width as usize / BLOCK_SIZE
    }

    /// Number of whole 8×8 blocks vertically.
    pub fn blocks_tall(&self) -> usize {
        self.height as usize / BLOCK_SIZE
    }

    /// Copy out the 8×8 block at block row `br`, block column `bc`, i.e.
    /// pixels `[8*br, 8*br+8) x [8*bc, 8*bc+8)`.
    ///
    /// Only meaningful on a gray raster; callers collapse covers with
    /// [`to_luma`](Self::to_luma) first.
    pub fn block(&self, br: usize, bc: usize) -> Block {
        debug_assert_eq!(self.layout, PixelLayout::Gray);
        let w = self.width as usize;
        let mut pixels = [0u8; 64];
        for (r, row) in pixels.chunks_exact_mut(BLOCK_SIZE).enumerate() {
            let start = (br * BLOCK_SIZE + r) * w + bc * BLOCK_SIZE;
            row.copy_from_slice(&self.data[start..start + BLOCK_SIZE]);
        }
        Block { pixels }
    }
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) as u8
}

/// One 8×8 luminance block, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pixels: [u8; 64],
}

impl Block {
    pub fn from_rows(rows: [[u8; 8]; 8]) -> Self {
        let mut pixels = [0u8; 64];
        for (dst, src) in pixels.chunks_exact_mut(8).zip(rows.iter()) {
            dst.copy_from_slice(src);
        }
        Self { pixels }
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.pixels[row * BLOCK_SIZE + col]
    }

    pub fn first_row(&self) -> &[u8] {
        &self.pixels[..BLOCK_SIZE]
    }

    pub fn pixels(&self) -> &[u8; 64] {
        &self.pixels
    }
}

#[cfg(feature = "image")]
mod image_interop {
    use super::{PixelLayout, Raster};
    use crate::stego::error::StegoError;

    impl From<image::GrayImage> for Raster {
        fn from(img: image::GrayImage) -> Self {
            let (width, height) = img.dimensions();
            Raster { width, height, layout: PixelLayout::Gray, data: img.into_raw() }
        }
    }

    impl From<image::RgbImage> for Raster {
        fn from(img: image::RgbImage) -> Self {
            let (width, height) = img.dimensions();
            Raster { width, height, layout: PixelLayout::Rgb, data: img.into_raw() }
        }
    }

    impl From<image::RgbaImage> for Raster {
        fn from(img: image::RgbaImage) -> Self {
            let (width, height) = img.dimensions();
            Raster { width, height, layout: PixelLayout::Rgba, data: img.into_raw() }
        }
    }

    impl From<image::DynamicImage> for Raster {
        /// Gray stays gray, images with alpha become RGBA, everything else RGB.
        fn from(img: image::DynamicImage) -> Self {
            let color = img.color();
            if !color.has_color() {
                img.into_luma8().into()
            } else if color.has_alpha() {
                img.into_rgba8().into()
            } else {
                img.into_rgb8().into()
            }
        }
    }

    impl TryFrom<Raster> for image::DynamicImage {
        type Error = StegoError;

        fn try_from(r: Raster) -> Result<Self, StegoError> {
            let expected = r.pixel_count() * r.layout.channels();
            let actual = r.data.len();
            let err = || StegoError::InvalidRaster { expected, actual };
            Ok(match r.layout {
                PixelLayout::Gray => {
                    image::DynamicImage::ImageLuma8(image::GrayImage::from_raw(r.width, r.height, r.data).ok_or_else(err)?)
                }
                PixelLayout::Rgb => {
                    image::DynamicImage::ImageRgb8(image::RgbImage::from_raw(r.width, r.height, r.data).ok_or_else(err)?)
                }
                PixelLayout::Rgba => {
                    image::DynamicImage::ImageRgba8(image::RgbaImage::from_raw(r.width, r.height, r.data).ok_or_else(err)?)
                }
            })
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_checks_buffer_length() {
        assert!(Raster::new(2, 2, PixelLayout::Rgb, vec![0; 12]).is_ok());
        assert_eq!(
            Raster::new(2, 2, PixelLayout::Rgb, vec![0; 11]),
            Err(StegoError::InvalidRaster { expected: 12, actual: 11 })
        );
    }

    #[test]
    fn luma_truncates() {
        // 0.299*255 + 0.587*0 + 0.114*0 = 76.245 -> 76
        let r = Raster::new(1, 1, PixelLayout::Rgb, vec![255, 0, 0]).unwrap();
        assert_eq!(r.to_luma().data(), &[76]);
        // white stays white, alpha ignored
        let r = Raster::new(1, 1, PixelLayout::Rgba, vec![255, 255, 255, 0]).unwrap();
        assert_eq!(r.to_luma().data(), &[255]);
        // 0.299*10 + 0.587*20 + 0.114*30 = 18.15 -> 18
        let r = Raster::new(1, 1, PixelLayout::Rgb, vec![10, 20, 30]).unwrap();
        assert_eq!(r.to_luma().data(), &[18]);
    }

    #[test]
    fn block_extraction_is_row_major() {
        let data: Vec<u8> = (0..16 * 8).map(|i| i as u8).collect();
        let r = Raster::gray(16, 8, data).unwrap();
        assert_eq!(r.blocks_wide(), 2);
        assert_eq!(r.blocks_tall(), 1);
        let b = r.block(0, 1);
        assert_eq!(b.first_row(), &[8, 9, 10, 11, 12, 13, 14, 15]);
        assert_eq!(b.get(1, 0), 24);
        assert_eq!(b.get(7, 7), 127);
    }

    #[test]
    fn from_rows_builds_gray() {
        let r = Raster::from_rows(&[[1u8, 2], [3, 4]]).unwrap();
        assert_eq!((r.width(), r.height()), (2, 2));
        assert_eq!(r.pixel(1, 1), &[4]);
    }
}
