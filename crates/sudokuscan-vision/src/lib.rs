// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// sudokuscan-vision — Photograph-to-grid pipeline for sudokuscan.
//
// Provides the pipeline stages (binarization, grid localisation, perspective
// rectification, cell segmentation, digit extraction, confidence aggregation),
// the digit classifier seam with its Tesseract and ocrs backends, and the
// `SudokuScanner` that ties them together.

pub mod classifier;
pub mod decode;
pub mod scanner;
pub mod stages;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the primary entry points so callers can use `sudokuscan_vision::SudokuScanner` etc.
pub use classifier::{DigitClassifier, TesseractClassifier};
pub use decode::{decode_image, from_rgb_buffer};
pub use scanner::{CancelFlag, ScanReport, SudokuScanner};
pub use stages::CanonicalGrid;

#[cfg(feature = "ocr")]
pub use classifier::{OcrConfig, OcrsClassifier};
