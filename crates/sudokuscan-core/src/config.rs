// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan calibration profile.
//
// Every threshold, kernel size, and the canonical side length live here so a
// pipeline can be built for a different camera without touching the stages.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::types::GRID_SIZE;

/// Immutable configuration for one scanner instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub binarize: BinarizeConfig,
    pub locator: LocatorConfig,
    pub rectify: RectifyConfig,
    pub segment: SegmentConfig,
    pub extract: ExtractConfig,
}

/// Binarization of the raw photograph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinarizeConfig {
    /// Side of the Gaussian smoothing kernel (odd).
    pub blur_kernel: u32,
    /// Side of the adaptive-threshold neighbourhood (odd).
    pub block_size: u32,
    /// Constant subtracted from the local mean before comparison.
    pub offset: f32,
}

impl Default for BinarizeConfig {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            block_size: 11,
            offset: 2.0,
        }
    }
}

/// Grid boundary detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Polygon approximation tolerance as a fraction of the contour perimeter.
    pub epsilon_ratio: f64,
    /// Reject four-vertex boundaries that are not convex.
    pub require_convex: bool,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            epsilon_ratio: 0.02,
            require_convex: true,
        }
    }
}

/// Perspective rectification into the canonical square.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyConfig {
    /// Side length `S` of the canonical square, in pixels.
    pub side: u32,
    /// Side of the adaptive mean threshold neighbourhood (odd).
    pub block_size: u32,
    /// Constant subtracted from the local mean before comparison.
    pub offset: f32,
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self {
            side: 900,
            block_size: 11,
            offset: 2.0,
        }
    }
}

/// Largest structuring element the cell opening accepts.
pub const MAX_OPENING_SIZE: u32 = 255;

/// Cell cleanup. Pixel quantities are calibrated at `reference_side` and
/// rescaled to the actual canonical side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Canonical side the margin and foreground threshold were tuned for.
    pub reference_side: u32,
    /// Pixels cropped from every cell edge at `reference_side`.
    pub margin: u32,
    /// Side of the square structuring element used for the opening.
    pub opening_size: u32,
    /// Minimum foreground pixels for an occupied cell at `reference_side`.
    pub min_foreground: u32,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            reference_side: 900,
            margin: 6,
            opening_size: 2,
            min_foreground: 35,
        }
    }
}

impl SegmentConfig {
    fn scale(&self, side: u32) -> f64 {
        f64::from(side) / f64::from(self.reference_side.max(1))
    }

    /// Margin for a canonical square of `side` pixels (scales linearly).
    pub fn margin_for(&self, side: u32) -> u32 {
        (f64::from(self.margin) * self.scale(side)).round() as u32
    }

    /// Foreground threshold for a canonical square of `side` pixels
    /// (scales with cell area).
    pub fn min_foreground_for(&self, side: u32) -> u32 {
        let scale = self.scale(side);
        (f64::from(self.min_foreground) * scale * scale).round().max(1.0) as u32
    }
}

/// Per-cell digit extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Process the 81 cells on the rayon thread pool.
    pub parallel: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl ScanConfig {
    /// Profile for low-resolution cameras: a 450 px canonical square.
    pub fn low_resolution() -> Self {
        Self::default().with_side(450)
    }

    /// Same calibration, different canonical side.
    pub fn with_side(mut self, side: u32) -> Self {
        self.rectify.side = side;
        self
    }

    /// Load a profile from JSON text. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a profile from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Check the invariants the stages rely on.
    pub fn validate(&self) -> Result<()> {
        let odd = |name: &str, value: u32| {
            if value < 3 || value % 2 == 0 {
                Err(ScanError::InvalidConfig(format!(
                    "{name} must be an odd number >= 3, got {value}"
                )))
            } else {
                Ok(())
            }
        };
        odd("binarize.blur_kernel", self.binarize.blur_kernel)?;
        odd("binarize.block_size", self.binarize.block_size)?;
        odd("rectify.block_size", self.rectify.block_size)?;

        if !(self.locator.epsilon_ratio > 0.0 && self.locator.epsilon_ratio < 1.0) {
            return Err(ScanError::InvalidConfig(format!(
                "locator.epsilon_ratio must be in (0, 1), got {}",
                self.locator.epsilon_ratio
            )));
        }

        if self.segment.reference_side == 0 {
            return Err(ScanError::InvalidConfig(
                "segment.reference_side must be positive".into(),
            ));
        }
        if !(1..=MAX_OPENING_SIZE).contains(&self.segment.opening_size) {
            return Err(ScanError::InvalidConfig(format!(
                "segment.opening_size must be in 1..={MAX_OPENING_SIZE}, got {}",
                self.segment.opening_size
            )));
        }

        let side = self.rectify.side;
        if side % GRID_SIZE as u32 != 0 {
            return Err(ScanError::InvalidConfig(format!(
                "rectify.side must be a multiple of {GRID_SIZE}, got {side}"
            )));
        }
        let cell = side / GRID_SIZE as u32;
        let margin = self.segment.margin_for(side);
        if cell <= 2 * margin + self.segment.opening_size {
            return Err(ScanError::InvalidConfig(format!(
                "rectify.side {side} leaves no room inside {cell} px cells with a {margin} px margin"
            )));
        }
        Ok(())
    }
}
