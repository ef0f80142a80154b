// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Digit classifier seam — the only external collaborator of the pipeline.
//
// Backends:
// - `TesseractClassifier`: the `tesseract` executable in single-character mode.
// - `OcrsClassifier` (feature `ocr`): the pure-Rust `ocrs` engine.

pub mod tesseract;

#[cfg(feature = "ocr")]
pub mod ocrs;

use image::{GrayImage, Luma};
use sudokuscan_core::error::Result;
use sudokuscan_core::types::DigitReading;

pub use tesseract::TesseractClassifier;

#[cfg(feature = "ocr")]
pub use self::ocrs::{OcrConfig, OcrsClassifier};

/// Recognises a single isolated glyph as one of the digits 1–9.
///
/// The pipeline only calls [`recognize`](Self::recognize) for cells that hold
/// ink, and may call it from several threads at once.
pub trait DigitClassifier: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Classify one glyph.
    ///
    /// `glyph` is a binary image with ink as non-zero pixels on a zero
    /// background. `Ok(None)` means the backend saw no digit; an `Err` is a
    /// backend failure. Neither aborts a scan.
    fn recognize(&self, glyph: &GrayImage) -> Result<Option<DigitReading>>;
}

impl<C: DigitClassifier + ?Sized> DigitClassifier for &C {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&self, glyph: &GrayImage) -> Result<Option<DigitReading>> {
        (**self).recognize(glyph)
    }
}

impl<C: DigitClassifier + ?Sized> DigitClassifier for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&self, glyph: &GrayImage) -> Result<Option<DigitReading>> {
        (**self).recognize(glyph)
    }
}

/// Render a binary glyph the way text engines expect a page: dark ink on a
/// white background, surrounded by `padding` pixels of white.
pub fn render_glyph_page(glyph: &GrayImage, padding: u32) -> GrayImage {
    let (w, h) = glyph.dimensions();
    let mut page = GrayImage::from_pixel(w + 2 * padding, h + 2 * padding, Luma([255u8]));
    for (x, y, pixel) in glyph.enumerate_pixels() {
        if pixel.0[0] != 0 {
            page.put_pixel(x + padding, y + padding, Luma([0u8]));
        }
    }
    page
}
