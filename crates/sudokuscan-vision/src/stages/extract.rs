// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Digit extraction — hand occupied cells to the classifier and turn its answer
// into a per-cell outcome.

use sudokuscan_core::types::RecognitionOutcome;
use tracing::{debug, warn};

use crate::classifier::DigitClassifier;
use crate::stages::segment::Cell;

/// Recognise the digit in one cell.
///
/// Blank cells never reach the classifier. A classifier error is logged and
/// recorded as [`RecognitionOutcome::Unreadable`]; it never fails the scan.
pub fn extract_digit<C: DigitClassifier + ?Sized>(cell: &Cell, classifier: &C) -> RecognitionOutcome {
    if cell.blank {
        return RecognitionOutcome::Blank;
    }

    match classifier.recognize(&cell.image) {
        Ok(Some(reading)) => {
            debug!(cell = %cell.index, digit = %reading.digit, confidence = ?reading.confidence, "Digit recognised");
            RecognitionOutcome::Recognized(reading)
        }
        Ok(None) => {
            debug!(cell = %cell.index, ink = cell.ink, "Glyph not recognised as a digit");
            RecognitionOutcome::Unreadable
        }
        Err(err) => {
            warn!(cell = %cell.index, classifier = classifier.name(), error = %err, "Classifier failed");
            RecognitionOutcome::Unreadable
        }
    }
}
