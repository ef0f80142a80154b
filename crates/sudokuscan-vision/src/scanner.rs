// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SudokuScanner — runs the full photograph-to-grid pipeline with an immutable
// configuration and a pluggable digit classifier.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use image::DynamicImage;
use rayon::prelude::*;
use sudokuscan_core::config::ScanConfig;
use sudokuscan_core::error::{Result, ScanError};
use sudokuscan_core::types::{
    CellIndex, GRID_SIZE, Grid, ParseResult, Quadrilateral, RecognitionOutcome,
};
use tracing::{debug, info, instrument};

use crate::classifier::DigitClassifier;
use crate::decode::decode_image;
use crate::stages::binarize::binarize_gray;
use crate::stages::confidence::aggregate;
use crate::stages::extract::extract_digit;
use crate::stages::locate::locate_grid;
use crate::stages::rectify::{CanonicalGrid, rectify};
use crate::stages::segment::{CellLayout, extract_cell};

/// Cooperative cancellation signal, checked before every cell.
///
/// Clones share the same flag, so the service layer can keep one handle and
/// pass another into a running scan.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ScanError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Everything a scan learned, for callers that want more than the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub result: ParseResult,
    /// Puzzle boundary in source-image pixel coordinates.
    pub quad: Quadrilateral,
    pub outcomes: [[RecognitionOutcome; GRID_SIZE]; GRID_SIZE],
}

impl ScanReport {
    /// Cells that held a glyph and were sent to the classifier.
    pub fn attempted(&self) -> usize {
        self.outcomes.iter().flatten().filter(|o| o.glyph_detected()).count()
    }
}

/// The photograph-to-grid pipeline.
///
/// Holds no per-request state: one scanner can serve many images, from many
/// threads, as long as its classifier is `Sync`.
pub struct SudokuScanner<C> {
    config: ScanConfig,
    classifier: C,
}

impl<C: DigitClassifier> SudokuScanner<C> {
    /// Build a scanner after validating `config`.
    pub fn new(config: ScanConfig, classifier: C) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, classifier })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Decode `bytes` and scan the result.
    pub fn scan_bytes(&self, bytes: &[u8]) -> Result<ParseResult> {
        let image = decode_image(bytes)?;
        self.scan(&image)
    }

    pub fn scan(&self, image: &DynamicImage) -> Result<ParseResult> {
        self.scan_with_cancel(image, &CancelFlag::new())
    }

    pub fn scan_with_cancel(&self, image: &DynamicImage, cancel: &CancelFlag) -> Result<ParseResult> {
        self.scan_detailed(image, cancel).map(|report| report.result)
    }

    /// Run every stage and keep the intermediate geometry and per-cell outcomes.
    ///
    /// Geometry failures abort the scan; per-cell recognition failures only
    /// lower the confidence.
    #[instrument(skip_all, fields(
        width = image.width(),
        height = image.height(),
        classifier = self.classifier.name(),
    ))]
    pub fn scan_detailed(&self, image: &DynamicImage, cancel: &CancelFlag) -> Result<ScanReport> {
        cancel.check()?;
        let (quad, canonical) = self.locate_and_rectify(image)?;
        let outcomes = self.recognize_cells(&canonical, cancel)?;

        let grid = Grid::from_outcomes(&outcomes);
        let confidence = aggregate(outcomes.iter().flatten());
        let report = ScanReport {
            result: ParseResult { grid, confidence },
            quad,
            outcomes,
        };

        info!(
            attempted = report.attempted(),
            filled = grid.filled_count(),
            confidence,
            "Scan complete"
        );
        Ok(report)
    }

    /// Stop after rectification and return the canonical grid.
    pub fn rectify_only(&self, image: &DynamicImage) -> Result<CanonicalGrid> {
        self.locate_and_rectify(image).map(|(_, canonical)| canonical)
    }

    fn locate_and_rectify(&self, image: &DynamicImage) -> Result<(Quadrilateral, CanonicalGrid)> {
        let gray = image.to_luma8();
        let binary = binarize_gray(&gray, &self.config.binarize);
        let quad = locate_grid(&binary, &self.config.locator)?;
        let canonical = rectify(&gray, &quad, &self.config.rectify)?;
        Ok((quad, canonical))
    }

    /// Segment and recognise all 81 cells into a preallocated (row, col) array.
    fn recognize_cells(
        &self,
        canonical: &CanonicalGrid,
        cancel: &CancelFlag,
    ) -> Result<[[RecognitionOutcome; GRID_SIZE]; GRID_SIZE]> {
        let layout = CellLayout::new(canonical.side(), &self.config.segment);
        let mut outcomes = [[RecognitionOutcome::Blank; GRID_SIZE]; GRID_SIZE];

        let process = |linear: usize, slot: &mut RecognitionOutcome| -> Result<()> {
            cancel.check()?;
            let index = CellIndex {
                row: linear / GRID_SIZE,
                col: linear % GRID_SIZE,
            };
            let cell = extract_cell(canonical, index, &layout);
            *slot = extract_digit(&cell, &self.classifier);
            Ok(())
        };

        let cells = outcomes.as_flattened_mut();
        if self.config.extract.parallel {
            cells
                .par_iter_mut()
                .enumerate()
                .try_for_each(|(linear, slot)| process(linear, slot))?;
        } else {
            cells
                .iter_mut()
                .enumerate()
                .try_for_each(|(linear, slot)| process(linear, slot))?;
        }

        debug!(
            parallel = self.config.extract.parallel,
            span = layout.span,
            min_ink = layout.min_ink,
            "Cells recognised"
        );
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        CancellingClassifier, FixedClassifier, Glyph, ShapeClassifier, render_puzzle,
        render_tilted_puzzle, render_two_squares,
    };
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn five_and_three() -> DynamicImage {
        render_puzzle(&[(0, 0, Glyph::TallBar), (0, 1, Glyph::WideBar)])
    }

    fn expected_grid() -> Grid {
        let mut rows = [[0u8; GRID_SIZE]; GRID_SIZE];
        rows[0][0] = 5;
        rows[0][1] = 3;
        Grid::try_from(rows).unwrap()
    }

    fn scanner<C: DigitClassifier>(classifier: C) -> SudokuScanner<C> {
        SudokuScanner::new(ScanConfig::default(), classifier).unwrap()
    }

    #[test]
    fn reads_five_and_three_from_flat_photo() {
        let scanner = scanner(ShapeClassifier::new());
        let result = scanner.scan(&five_and_three()).unwrap();

        assert_eq!(result.grid, expected_grid());
        assert_eq!(result.confidence, 1.0);
        // Blank cells never reach the classifier.
        assert_eq!(scanner.classifier().calls(), 2);
    }

    #[test]
    fn detailed_report_marks_only_glyph_cells_attempted() {
        let scanner = scanner(ShapeClassifier::new());
        let report = scanner
            .scan_detailed(&five_and_three(), &CancelFlag::new())
            .unwrap();

        assert_eq!(report.attempted(), 2);
        for index in CellIndex::all() {
            let outcome = report.outcomes[index.row][index.col];
            let occupied = index.row == 0 && index.col <= 1;
            assert_eq!(outcome.glyph_detected(), occupied, "cell {index}");
        }
    }

    #[test]
    fn empty_grid_has_zero_confidence() {
        let scanner = scanner(ShapeClassifier::new());
        let result = scanner.scan(&render_puzzle(&[])).unwrap();
        assert_eq!(result.grid, Grid::empty());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(scanner.classifier().calls(), 0);
    }

    #[test]
    fn all_white_photo_has_no_grid() {
        let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(640, 480, Rgb([255, 255, 255])));
        let err = scanner(ShapeClassifier::new()).scan(&white).unwrap_err();
        assert!(matches!(err, ScanError::NoGridFound));
    }

    #[test]
    fn overlapping_shapes_are_ambiguous() {
        let err = scanner(ShapeClassifier::new())
            .scan(&render_two_squares())
            .unwrap_err();
        assert!(matches!(err, ScanError::AmbiguousGrid { vertices } if vertices >= 5));
    }

    #[test]
    fn scanning_is_idempotent() {
        let scanner = scanner(ShapeClassifier::new());
        let image = five_and_three();
        let first = scanner.scan(&image).unwrap();
        let second = scanner.scan(&image).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let image = five_and_three();
        let mut config = ScanConfig::default();
        config.extract.parallel = false;
        let sequential = SudokuScanner::new(config, ShapeClassifier::new())
            .unwrap()
            .scan(&image)
            .unwrap();
        let parallel = scanner(ShapeClassifier::new()).scan(&image).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn unreadable_glyph_lowers_confidence() {
        let scanner = scanner(ShapeClassifier::tall_only());
        let result = scanner.scan(&five_and_three()).unwrap();
        assert_eq!(result.grid.get(CellIndex { row: 0, col: 0 }), 5);
        assert_eq!(result.grid.get(CellIndex { row: 0, col: 1 }), 0);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn classifier_failures_are_absorbed() {
        let scanner = scanner(FixedClassifier::failing());
        let result = scanner.scan(&five_and_three()).unwrap();
        assert_eq!(result.grid, Grid::empty());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(scanner.classifier().calls(), 2);
    }

    #[test]
    fn tilted_photo_reads_the_same_grid() {
        let scanner = scanner(ShapeClassifier::new());
        let result = scanner.scan(&render_tilted_puzzle(&[
            (0, 0, Glyph::TallBar),
            (0, 1, Glyph::WideBar),
        ]));
        assert_eq!(result.unwrap().grid, expected_grid());
    }

    #[test]
    fn low_resolution_profile_reads_the_same_grid() {
        let scanner =
            SudokuScanner::new(ScanConfig::low_resolution(), ShapeClassifier::new()).unwrap();
        let result = scanner.scan(&five_and_three()).unwrap();
        assert_eq!(result.grid, expected_grid());
        assert_eq!(scanner.rectify_only(&five_and_three()).unwrap().side(), 450);
    }

    #[test]
    fn raised_flag_cancels_before_any_work() {
        let scanner = scanner(ShapeClassifier::new());
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = scanner.scan_with_cancel(&five_and_three(), &cancel).unwrap_err();
        assert!(matches!(err, ScanError::Cancelled));
        assert_eq!(scanner.classifier().calls(), 0);
    }

    #[test]
    fn cancellation_between_cells_stops_the_scan() {
        let cancel = CancelFlag::new();
        let mut config = ScanConfig::default();
        config.extract.parallel = false;
        let scanner = SudokuScanner::new(
            config,
            CancellingClassifier {
                flag: cancel.clone(),
            },
        )
        .unwrap();
        let err = scanner.scan_with_cancel(&five_and_three(), &cancel).unwrap_err();
        assert!(matches!(err, ScanError::Cancelled));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = ScanConfig::default().with_side(100);
        assert!(matches!(
            SudokuScanner::new(config, ShapeClassifier::new()),
            Err(ScanError::InvalidConfig(_))
        ));
    }

    #[test]
    fn scan_bytes_decodes_first() {
        let scanner = scanner(ShapeClassifier::new());
        assert!(matches!(
            scanner.scan_bytes(b"\x89PNG but not really"),
            Err(ScanError::DecodeFailed(_))
        ));

        let mut png = Vec::new();
        five_and_three()
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        assert_eq!(scanner.scan_bytes(&png).unwrap().grid, expected_grid());
    }

    #[test]
    fn located_quad_is_reported_in_source_pixels() {
        let scanner = scanner(ShapeClassifier::new());
        let report = scanner
            .scan_detailed(&five_and_three(), &CancelFlag::new())
            .unwrap();
        let (x, y) = report.quad.top_left();
        assert!((x - 50.0).abs() <= 2.0 && (y - 50.0).abs() <= 2.0);
    }
}
