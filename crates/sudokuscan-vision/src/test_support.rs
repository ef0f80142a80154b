// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic photographs and deterministic classifiers shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut};
use imageproc::geometric_transformations::{Interpolation, Projection, warp};
use imageproc::point::Point;
use imageproc::rect::Rect;
use sudokuscan_core::error::{Result, ScanError};
use sudokuscan_core::types::{Digit, DigitReading};

use crate::classifier::DigitClassifier;
use crate::scanner::CancelFlag;

pub const CANVAS: u32 = 1000;
pub const ORIGIN: i32 = 50;
pub const CELL: i32 = 100;
const BORDER: u32 = 4;
const RULE: u32 = 2;

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Printed shapes standing in for digits; [`ShapeClassifier`] reads them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    /// 10 × 50 px upright bar, read as `5`.
    TallBar,
    /// 50 × 10 px flat bar, read as `3`.
    WideBar,
}

impl Glyph {
    fn size(self) -> (u32, u32) {
        match self {
            Glyph::TallBar => (10, 50),
            Glyph::WideBar => (50, 10),
        }
    }
}

/// A flat, axis-aligned photograph: 900 px grid at (50, 50) on a 1000 px
/// white page, 4 px outer border, 2 px inner rules, glyphs centred in cells.
pub fn render_puzzle(glyphs: &[(usize, usize, Glyph)]) -> DynamicImage {
    let mut page = RgbImage::from_pixel(CANVAS, CANVAS, WHITE);
    let span = (9 * CELL) as u32;

    for (x, y, w, h) in [
        (ORIGIN, ORIGIN, span, BORDER),
        (ORIGIN, ORIGIN + 9 * CELL - BORDER as i32, span, BORDER),
        (ORIGIN, ORIGIN, BORDER, span),
        (ORIGIN + 9 * CELL - BORDER as i32, ORIGIN, BORDER, span),
    ] {
        draw_filled_rect_mut(&mut page, Rect::at(x, y).of_size(w, h), BLACK);
    }
    for i in 1..9 {
        let pos = ORIGIN + i * CELL - 1;
        draw_filled_rect_mut(&mut page, Rect::at(pos, ORIGIN).of_size(RULE, span), BLACK);
        draw_filled_rect_mut(&mut page, Rect::at(ORIGIN, pos).of_size(span, RULE), BLACK);
    }

    for &(row, col, glyph) in glyphs {
        let (w, h) = glyph.size();
        let cx = ORIGIN + col as i32 * CELL + CELL / 2;
        let cy = ORIGIN + row as i32 * CELL + CELL / 2;
        draw_filled_rect_mut(
            &mut page,
            Rect::at(cx - w as i32 / 2, cy - h as i32 / 2).of_size(w, h),
            BLACK,
        );
    }
    DynamicImage::ImageRgb8(page)
}

/// [`render_puzzle`] photographed at a mild angle.
pub fn render_tilted_puzzle(glyphs: &[(usize, usize, Glyph)]) -> DynamicImage {
    let flat = render_puzzle(glyphs).to_luma8();
    let c = CANVAS as f32;
    let projection = Projection::from_control_points(
        [(0.0, 0.0), (c, 0.0), (c, c), (0.0, c)],
        [(30.0, 20.0), (975.0, 40.0), (985.0, 990.0), (15.0, 970.0)],
    )
    .expect("control points are in general position");
    DynamicImage::ImageLuma8(warp(&flat, &projection, Interpolation::Bilinear, Luma([255u8])))
}

/// A single filled black quadrilateral on a white page.
pub fn render_quad(corners: &[(i32, i32); 4]) -> DynamicImage {
    let mut page = RgbImage::from_pixel(700, 700, WHITE);
    let points: Vec<Point<i32>> = corners.iter().map(|&(x, y)| Point::new(x, y)).collect();
    draw_polygon_mut(&mut page, &points, BLACK);
    DynamicImage::ImageRgb8(page)
}

/// Two overlapping filled squares whose union outline has eight vertices.
pub fn render_two_squares() -> DynamicImage {
    let mut page = RgbImage::from_pixel(800, 800, WHITE);
    draw_filled_rect_mut(&mut page, Rect::at(100, 100).of_size(400, 400), BLACK);
    draw_filled_rect_mut(&mut page, Rect::at(300, 300).of_size(400, 400), BLACK);
    DynamicImage::ImageRgb8(page)
}

/// Bounding box `(width, height)` of the non-zero pixels, if any.
fn ink_extent(glyph: &GrayImage) -> Option<(u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, p) in glyph.enumerate_pixels() {
        if p.0[0] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds.map(|(x0, y0, x1, y1)| (x1 - x0 + 1, y1 - y0 + 1))
}

/// Reads [`Glyph::TallBar`] as 5 and [`Glyph::WideBar`] as 3, counting calls.
#[derive(Debug, Default)]
pub struct ShapeClassifier {
    calls: AtomicUsize,
    /// Answer `None` for wide glyphs instead of 3.
    tall_only: bool,
}

impl ShapeClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tall_only() -> Self {
        Self {
            tall_only: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DigitClassifier for ShapeClassifier {
    fn name(&self) -> &str {
        "shape"
    }

    fn recognize(&self, glyph: &GrayImage) -> Result<Option<DigitReading>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some((w, h)) = ink_extent(glyph) else {
            return Ok(None);
        };
        let digit = match (h > w, self.tall_only) {
            (true, _) => 5,
            (false, false) => 3,
            (false, true) => return Ok(None),
        };
        Ok(Digit::new(digit).map(DigitReading::new))
    }
}

/// Always gives the same answer, counting calls.
#[derive(Debug)]
pub struct FixedClassifier {
    answer: Option<u8>,
    fail: bool,
    calls: AtomicUsize,
}

impl FixedClassifier {
    pub fn digit(d: u8) -> Self {
        Self {
            answer: Some(d),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn nothing() -> Self {
        Self {
            answer: None,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DigitClassifier for FixedClassifier {
    fn name(&self) -> &str {
        "fixed"
    }

    fn recognize(&self, _glyph: &GrayImage) -> Result<Option<DigitReading>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ScanError::Classifier("backend unavailable".into()));
        }
        Ok(self.answer.and_then(Digit::new).map(DigitReading::new))
    }
}

/// Raises a cancellation flag the first time it is asked for a digit.
#[derive(Debug)]
pub struct CancellingClassifier {
    pub flag: CancelFlag,
}

impl DigitClassifier for CancellingClassifier {
    fn name(&self) -> &str {
        "cancelling"
    }

    fn recognize(&self, _glyph: &GrayImage) -> Result<Option<DigitReading>> {
        self.flag.cancel();
        Ok(Digit::new(5).map(DigitReading::new))
    }
}
