// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Confidence aggregation — the mean recognition success over cells that held
// a glyph.

use sudokuscan_core::types::RecognitionOutcome;

/// Mean of the per-cell confidence samples, in `[0, 1]`.
///
/// Blank cells contribute nothing. With no attempted cells at all the result
/// is `0.0`, never NaN.
pub fn aggregate<'a>(outcomes: impl IntoIterator<Item = &'a RecognitionOutcome>) -> f64 {
    let (sum, count) = outcomes
        .into_iter()
        .filter_map(RecognitionOutcome::confidence_sample)
        .fold((0.0f64, 0usize), |(sum, count), sample| (sum + sample, count + 1));

    if count == 0 {
        return 0.0;
    }
    (sum / count as f64).clamp(0.0, 1.0)
}
