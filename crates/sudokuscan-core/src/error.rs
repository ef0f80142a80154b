// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for sudokuscan.

use thiserror::Error;

/// Top-level error type for all sudokuscan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Input errors --
    #[error("image could not be decoded: {0}")]
    DecodeFailed(String),

    // -- Geometry errors (fatal to a parse) --
    #[error("no grid found: the binarized image contains no contours")]
    NoGridFound,

    #[error("grid boundary is ambiguous: largest contour reduced to {vertices} vertices, expected 4")]
    AmbiguousGrid { vertices: usize },

    #[error("grid boundary is not a convex quadrilateral")]
    NonConvexGrid,

    #[error("perspective transform could not be computed from the grid corners")]
    DegenerateTransform,

    // -- Recognition errors (absorbed per cell) --
    #[error("digit classifier failed: {0}")]
    Classifier(String),

    // -- Control --
    #[error("scan cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- I/O --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScanError {
    /// Whether the error means the photograph itself is unusable.
    ///
    /// These failures call for a new photograph, as opposed to a successful
    /// parse with low confidence, which calls for manual verification.
    pub fn is_fatal_geometry(&self) -> bool {
        matches!(
            self,
            ScanError::DecodeFailed(_)
                | ScanError::NoGridFound
                | ScanError::AmbiguousGrid { .. }
                | ScanError::NonConvexGrid
                | ScanError::DegenerateTransform
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
