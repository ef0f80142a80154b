// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification — map the located quadrilateral onto a fixed
// S×S square and re-binarize at the normalised scale.

use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use sudokuscan_core::config::RectifyConfig;
use sudokuscan_core::error::{Result, ScanError};
use sudokuscan_core::types::{GRID_SIZE, Point2, Quadrilateral};
use tracing::{debug, info, instrument, warn};

use crate::stages::binarize::adaptive_mean_threshold;

/// A projective transform between two planar quadrilaterals.
#[derive(Debug, Clone, Copy)]
pub struct Homography {
    projection: Projection,
}

impl Homography {
    /// The transform taking each `src[i]` exactly onto `dst[i]`.
    ///
    /// Returns `None` when three or more points on either side are collinear,
    /// or when the solved matrix is not invertible.
    pub fn from_correspondences(src: [Point2; 4], dst: [Point2; 4]) -> Option<Self> {
        if has_collinear_triple(&src) || has_collinear_triple(&dst) {
            return None;
        }
        Projection::from_control_points(src, dst).map(|projection| Self { projection })
    }

    /// The transform taking `quad` onto `(0,0), (S,0), (S,S), (0,S)`.
    pub fn quad_to_square(quad: &Quadrilateral, side: u32) -> Option<Self> {
        let s = side as f32;
        Self::from_correspondences(quad.corners(), [(0.0, 0.0), (s, 0.0), (s, s), (0.0, s)])
    }

    /// Map a point. `None` if it lands on the line at infinity.
    pub fn apply(&self, point: Point2) -> Option<Point2> {
        let (x, y) = self.projection * point;
        (x.is_finite() && y.is_finite()).then_some((x, y))
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }
}

/// True if any three of the four points lie on one line.
fn has_collinear_triple(points: &[Point2; 4]) -> bool {
    let extent = points
        .iter()
        .flat_map(|p| [p.0.abs(), p.1.abs()])
        .fold(1.0f64, |acc, v| acc.max(f64::from(v)));
    let tolerance = 1e-9 * extent * extent;

    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES.iter().any(|&[i, j, k]| {
        let (a, b, c) = (points[i], points[j], points[k]);
        let cross = (f64::from(b.0) - f64::from(a.0)) * (f64::from(c.1) - f64::from(a.1))
            - (f64::from(b.1) - f64::from(a.1)) * (f64::from(c.0) - f64::from(a.0));
        cross.abs() <= tolerance
    })
}

/// The rectified, binarized S×S puzzle (ink = non-zero).
#[derive(Debug, Clone)]
pub struct CanonicalGrid {
    image: GrayImage,
}

impl CanonicalGrid {
    /// Wrap an existing square binary image.
    ///
    /// Returns `None` unless the image is square and at least 9 px wide.
    pub fn from_binary(image: GrayImage) -> Option<Self> {
        let (w, h) = image.dimensions();
        (w == h && w as usize >= GRID_SIZE).then_some(Self { image })
    }

    pub fn side(&self) -> u32 {
        self.image.width()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }
}

/// Warp `gray` so that `quad` fills an S×S square, then binarize it.
///
/// The output is always exactly `config.side` pixels on each side.
#[instrument(skip_all, fields(side = config.side))]
pub fn rectify(gray: &GrayImage, quad: &Quadrilateral, config: &RectifyConfig) -> Result<CanonicalGrid> {
    let homography = Homography::quad_to_square(quad, config.side).ok_or_else(|| {
        warn!(corners = ?quad.corners(), "Corners do not define a perspective transform");
        ScanError::DegenerateTransform
    })?;
    debug!(projection = ?homography.projection(), "Homography computed");

    let mut warped = GrayImage::new(config.side, config.side);
    warp_into(gray, homography.projection(), Interpolation::Bilinear, Luma([255u8]), &mut warped);

    let binary = adaptive_mean_threshold(&warped, config.block_size, config.offset);
    info!(side = config.side, "Grid rectified");
    Ok(CanonicalGrid { image: binary })
}
