// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Input decoding — turn uploaded bytes or a raw RGB buffer into an image the
// pipeline can consume.

use image::{DynamicImage, RgbImage};
use sudokuscan_core::error::{Result, ScanError};
use tracing::{debug, instrument};

/// Decode an encoded image (PNG, JPEG, ...) from memory.
#[instrument(skip_all, fields(bytes = bytes.len()))]
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(ScanError::DecodeFailed("input is empty".into()));
    }
    let image =
        image::load_from_memory(bytes).map_err(|err| ScanError::DecodeFailed(err.to_string()))?;
    debug!(
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "Image decoded"
    );
    Ok(image)
}

/// Wrap an already-decoded `height × width × 3` 8-bit RGB buffer.
pub fn from_rgb_buffer(width: u32, height: u32, pixels: Vec<u8>) -> Result<DynamicImage> {
    let expected = width as usize * height as usize * 3;
    let actual = pixels.len();
    RgbImage::from_raw(width, height, pixels)
        .filter(|_| width > 0 && height > 0)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| {
            ScanError::DecodeFailed(format!(
                "RGB buffer of {actual} bytes does not match {width}x{height} (expected {expected})"
            ))
        })
}
