// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cell segmentation — split the canonical square into 81 equal cells, crop
// the grid-line margin, erase thin line remnants with a morphological
// opening, and classify each cell as blank or occupied.

use image::{GrayImage, Luma, imageops};
use imageproc::morphology::{Mask, grayscale_dilate, grayscale_erode};
use sudokuscan_core::config::{MAX_OPENING_SIZE, SegmentConfig};
use sudokuscan_core::types::{CellIndex, GRID_SIZE};
use tracing::{debug, instrument};

use crate::stages::binarize::{INK, count_ink};
use crate::stages::rectify::CanonicalGrid;

/// One cleaned cell of the canonical grid.
#[derive(Debug, Clone)]
pub struct Cell {
    pub index: CellIndex,
    /// Binary glyph region after margin crop and opening (ink = non-zero).
    pub image: GrayImage,
    /// Foreground pixels remaining after cleanup.
    pub ink: u32,
    /// Whether `ink` fell below the occupancy threshold.
    pub blank: bool,
}

impl Cell {
    pub fn is_occupied(&self) -> bool {
        !self.blank
    }
}

/// Pixel geometry shared by all cells of one canonical grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellLayout {
    /// Span of one cell along each axis: `side / 9`.
    pub span: u32,
    pub margin: u32,
    pub element: SquareElement,
    pub min_ink: u32,
}

impl CellLayout {
    pub fn new(side: u32, config: &SegmentConfig) -> Self {
        Self {
            span: side / GRID_SIZE as u32,
            margin: config.margin_for(side),
            element: SquareElement::new(config.opening_size),
            min_ink: config.min_foreground_for(side),
        }
    }

    /// Top-left corner and side of the cropped region for `index`.
    pub fn crop_rect(&self, index: CellIndex) -> (u32, u32, u32) {
        let x = index.col as u32 * self.span + self.margin;
        let y = index.row as u32 * self.span + self.margin;
        let size = self.span.saturating_sub(2 * self.margin);
        (x, y, size)
    }
}

/// Cut, clean, and classify a single cell.
pub fn extract_cell(canonical: &CanonicalGrid, index: CellIndex, layout: &CellLayout) -> Cell {
    let (x, y, size) = layout.crop_rect(index);
    let cropped = imageops::crop_imm(canonical.as_image(), x, y, size, size).to_image();
    let cleaned = layout.element.open(&cropped);
    let ink = count_ink(&cleaned);
    Cell {
        index,
        image: cleaned,
        ink,
        blank: ink < layout.min_ink,
    }
}

/// All 81 cells in row-major order.
#[instrument(skip_all, fields(side = canonical.side()))]
pub fn segment(canonical: &CanonicalGrid, config: &SegmentConfig) -> Vec<Cell> {
    let layout = CellLayout::new(canonical.side(), config);
    let cells: Vec<Cell> = CellIndex::all()
        .map(|index| extract_cell(canonical, index, &layout))
        .collect();
    debug!(
        span = layout.span,
        margin = layout.margin,
        min_ink = layout.min_ink,
        occupied = cells.iter().filter(|c| c.is_occupied()).count(),
        "Grid segmented"
    );
    cells
}

// -- Morphology ---------------------------------------------------------------

/// A filled `size × size` structuring element anchored at `size / 2`.
///
/// imageproc applies a mask at the same offsets for erosion and dilation, so
/// an even-sized element is kept together with its point reflection. Eroding
/// with one and dilating with the other is a true opening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquareElement {
    size: u32,
    erode: Mask,
    dilate: Mask,
}

impl SquareElement {
    /// Sizes are clamped to `1..=MAX_OPENING_SIZE`; size 1 is the identity.
    pub fn new(size: u32) -> Self {
        let size = size.clamp(1, MAX_OPENING_SIZE);
        let square = GrayImage::from_pixel(size, size, Luma([INK]));
        // Both anchors are below 256 after the clamp.
        let anchor = (size / 2) as u8;
        let reflected = (size - 1 - size / 2) as u8;
        Self {
            size,
            erode: Mask::from_image(&square, anchor, anchor),
            dilate: Mask::from_image(&square, reflected, reflected),
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Morphological opening: strokes thinner than `size` vanish, and no
    /// pixel that was paper becomes ink.
    pub fn open(&self, image: &GrayImage) -> GrayImage {
        grayscale_dilate(&grayscale_erode(image, &self.erode), &self.dilate)
    }
}
