// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Thumbnail decode/encode/resample/compare, the codec collaborator the core
//! spec treats as external (§6) with a concrete implementation supplied here
//! (§6-FULL), built on the `image` crate and transcribed arithmetic from
//! `original_source/src/img.c`.

use crate::error::{ReedError, ReedResult};
use image::imageops::FilterType;
use image::{GenericImageView, ImageBuffer, Rgba, RgbaImage};
use std::path::Path;

/// Thumbnail width, in the source `THUMB_CX`.
pub const THUMB_CX: u32 = 64;
/// Thumbnail height, in the source `THUMB_CY`.
pub const THUMB_CY: u32 = 64;
/// Total pixels in a thumbnail, `THUMB_CX * THUMB_CY`.
pub const THUMB_NPIXELS: usize = (THUMB_CX * THUMB_CY) as usize;

/// Per-channel pixel tolerance used by `pixel_compare_fuzzy`.
pub const DIFF_TOLERANCE: f32 = 1.5;

/// Maximum aspect-ratio difference before two thumbnails of different
/// dimensions are considered incomparable. Not specified by name in the
/// retrieved source; chosen as an Open Question resolution (DESIGN.md).
pub const MAX_RATIODIFF: f32 = 0.1;

/// Maximum number of mismatched pixels tolerated by `pixel_compare_fuzzy`
/// before two thumbnails are rejected as duplicates. Chosen as 5% of the
/// fixed pixel count (Open Question resolution, DESIGN.md).
pub const MAX_PIXELDIFF: usize = THUMB_NPIXELS / 20;

/// A decoded, resampled thumbnail: `width * height` ARGB pixels, packed as
/// `0xAARRGGBB`, matching the source's 32-bit pixel representation.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl Thumbnail {
    fn from_rgba_image(img: &RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = img
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
            })
            .collect();
        Self { width, height, pixels }
    }

    fn to_rgba_image(&self) -> RgbaImage {
        let mut img = ImageBuffer::new(self.width, self.height);
        for (i, px) in self.pixels.iter().enumerate() {
            let x = (i as u32) % self.width;
            let y = (i as u32) / self.width;
            let a = ((px >> 24) & 0xFF) as u8;
            let r = ((px >> 16) & 0xFF) as u8;
            let g = ((px >> 8) & 0xFF) as u8;
            let b = (px & 0xFF) as u8;
            img.put_pixel(x, y, Rgba([r, g, b, a]));
        }
        img
    }

    fn channel(&self, idx: u32, shift: u32) -> u8 {
        ((self.pixels[idx as usize] >> shift) & 0xFF) as u8
    }
}

/// Extensions the source's `ImgIsImageFile` recognizes. WBMP is dropped: the
/// `image` crate has no decoder for it (noted in DESIGN.md).
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "dib"];

/// Whether `path`'s extension matches a supported image format, case
/// insensitively.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decodes `path`, resamples to [`THUMB_CX`]x[`THUMB_CY`], and returns the
/// thumbnail plus the raw source bytes. Returns `Ok(None)` (not an error)
/// when the format can't be sniffed, mirroring `ImgLoadGd` returning a null
/// image for unrecognized content.
pub fn thumb_create(path: &Path) -> ReedResult<(Option<Thumbnail>, Vec<u8>)> {
    let source_bytes = std::fs::read(path)?;

    let decoded = match image::load_from_memory(&source_bytes) {
        Ok(img) => img,
        Err(_) => return Ok((None, source_bytes)),
    };

    let resized = decoded.resize_exact(THUMB_CX, THUMB_CY, FilterType::Triangle);
    let thumb = Thumbnail::from_rgba_image(&resized.to_rgba8());
    Ok((Some(thumb), source_bytes))
}

/// Resamples `src` to `w`x`h`.
pub fn resample(src: &Thumbnail, w: u32, h: u32) -> Thumbnail {
    let img = src.to_rgba_image();
    let resized = image::imageops::resize(&img, w, h, FilterType::Triangle);
    Thumbnail::from_rgba_image(&resized)
}

/// Encodes a thumbnail as PNG bytes.
pub fn encode_png(thumb: &Thumbnail) -> ReedResult<Vec<u8>> {
    let img = thumb.to_rgba_image();
    let mut bytes = Vec::new();
    img.write_with_encoder(image::codecs::png::PngEncoder::new(&mut bytes))
        .map_err(|e| ReedError::CodecError {
            reason: format!("png encode: {}", e),
        })?;
    Ok(bytes)
}

/// Decodes PNG bytes into a thumbnail.
pub fn decode_png(bytes: &[u8]) -> ReedResult<Thumbnail> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map_err(|e| ReedError::CodecError {
            reason: format!("png decode: {}", e),
        })?;
    Ok(Thumbnail::from_rgba_image(&img.to_rgba8()))
}

/// Σ over RGB channels of (mean channel value)², the B+-tree key for a
/// thumbnail. Transcribed from `_ThumbCalcKey`.
pub fn signature(thumb: &Thumbnail) -> f32 {
    let n = thumb.pixels.len() as f32;
    if n == 0.0 {
        return 0.0;
    }
    let mut sums = [0u64; 3];
    for i in 0..thumb.pixels.len() as u32 {
        sums[0] += thumb.channel(i, 16) as u64; // R
        sums[1] += thumb.channel(i, 8) as u64; // G
        sums[2] += thumb.channel(i, 0) as u64; // B
    }
    sums.iter()
        .map(|&s| {
            let avg = s as f32 / n;
            avg * avg
        })
        .sum()
}

/// Per-channel absolute difference, mirroring `ImgGetAbsColorDiff`.
fn channel_diff(a: u8, b: u8) -> f32 {
    (a as i32 - b as i32).unsigned_abs() as f32
}

/// Whether two same-sized thumbnails are close enough to be duplicates:
/// count pixels whose per-channel differences all stay below `tolerance`,
/// rejecting once the mismatch count passes [`MAX_PIXELDIFF`].
pub fn pixel_compare_fuzzy(a: &Thumbnail, b: &Thumbnail, tolerance: f32) -> ReedResult<bool> {
    let resampled;
    let a = if a.width != b.width || a.height != b.height {
        resampled = resample_to_match(a, b)?;
        &resampled
    } else {
        a
    };

    let mut mismatches = 0usize;
    for i in 0..a.pixels.len() as u32 {
        let dr = channel_diff(a.channel(i, 16), b.channel(i, 16));
        let dg = channel_diff(a.channel(i, 8), b.channel(i, 8));
        let db = channel_diff(a.channel(i, 0), b.channel(i, 0));
        if dr > tolerance || dg > tolerance || db > tolerance {
            mismatches += 1;
            if mismatches > MAX_PIXELDIFF {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Resamples the larger of two differently-sized thumbnails down to the
/// smaller, if their aspect ratios are within [`MAX_RATIODIFF`]; otherwise
/// reports a codec error (the pair is incomparable).
fn resample_to_match(a: &Thumbnail, b: &Thumbnail) -> ReedResult<Thumbnail> {
    let ratio_a = a.width as f32 / a.height as f32;
    let ratio_b = b.width as f32 / b.height as f32;
    if (ratio_a - ratio_b).abs() > MAX_RATIODIFF {
        return Err(ReedError::CodecError {
            reason: "aspect ratios differ too much to compare".to_string(),
        });
    }
    let a_pixels = a.width as u64 * a.height as u64;
    let b_pixels = b.width as u64 * b.height as u64;
    if a_pixels > b_pixels {
        Ok(resample(a, b.width, b.height))
    } else {
        Ok(a.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, argb: u32) -> Thumbnail {
        Thumbnail {
            width,
            height,
            pixels: vec![argb; (width * height) as usize],
        }
    }

    #[test]
    fn signature_of_solid_color_is_sum_of_squared_channels() {
        let thumb = solid(4, 4, 0xFF102030);
        let sig = signature(&thumb);
        let expected = (0x10_u32 as f32).powi(2) + (0x20_u32 as f32).powi(2) + (0x30_u32 as f32).powi(2);
        assert!((sig - expected).abs() < 1e-3);
    }

    #[test]
    fn signature_of_empty_thumbnail_is_zero() {
        let thumb = Thumbnail { width: 0, height: 0, pixels: Vec::new() };
        assert_eq!(signature(&thumb), 0.0);
    }

    #[test]
    fn pixel_compare_matches_identical_thumbnails() {
        let a = solid(8, 8, 0xFF808080);
        let b = a.clone();
        assert!(pixel_compare_fuzzy(&a, &b, DIFF_TOLERANCE).unwrap());
    }

    #[test]
    fn pixel_compare_rejects_very_different_thumbnails() {
        let a = solid(8, 8, 0xFF000000);
        let b = solid(8, 8, 0xFFFFFFFF);
        assert!(!pixel_compare_fuzzy(&a, &b, DIFF_TOLERANCE).unwrap());
    }

    #[test]
    fn pixel_compare_tolerates_a_handful_of_outlier_pixels() {
        let mut pixels = vec![0xFF808080u32; THUMB_NPIXELS];
        // Flip fewer pixels than MAX_PIXELDIFF tolerates.
        for p in pixels.iter_mut().take(MAX_PIXELDIFF - 1) {
            *p = 0xFF000000;
        }
        let a = Thumbnail { width: THUMB_CX, height: THUMB_CY, pixels };
        let b = solid(THUMB_CX, THUMB_CY, 0xFF808080);
        assert!(pixel_compare_fuzzy(&a, &b, DIFF_TOLERANCE).unwrap());
    }

    #[test]
    fn resample_to_match_rejects_incompatible_aspect_ratios() {
        let a = solid(100, 100, 0xFF000000);
        let b = solid(100, 10, 0xFF000000);
        assert!(resample_to_match(&a, &b).is_err());
    }

    #[test]
    fn png_round_trip_preserves_dimensions_and_pixels() {
        let thumb = solid(THUMB_CX, THUMB_CY, 0xFFAABBCC);
        let encoded = encode_png(&thumb).unwrap();
        let decoded = decode_png(&encoded).unwrap();
        assert_eq!(decoded.width, thumb.width);
        assert_eq!(decoded.height, thumb.height);
        assert_eq!(decoded.pixels, thumb.pixels);
    }

    #[test]
    fn is_image_file_matches_known_extensions_case_insensitively() {
        assert!(is_image_file(Path::new("photo.PNG")));
        assert!(is_image_file(Path::new("photo.jpg")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("no_extension")));
    }
}
