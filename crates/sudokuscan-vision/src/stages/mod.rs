// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline stages, in the order a scan runs them: binarize, locate, rectify,
// segment, extract, and aggregate confidence.

pub mod binarize;
pub mod confidence;
pub mod extract;
pub mod locate;
pub mod rectify;
pub mod segment;

pub use binarize::binarize;
pub use confidence::aggregate;
pub use extract::extract_digit;
pub use locate::locate_grid;
pub use rectify::{CanonicalGrid, Homography, rectify};
pub use segment::{Cell, CellLayout, segment};
