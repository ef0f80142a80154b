// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable messages for scan failures and low-confidence results.
//
// "No grid in the photo" and "some digits could not be read" need different
// actions from the user (take a new photo vs. check the digits), so they are
// never folded into the same message.

use crate::error::ScanError;
use crate::types::ParseResult;

/// What the user has to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Nothing went wrong on the user's side; retrying may succeed.
    Transient,
    /// The photograph cannot be used; a new one is needed.
    RetakePhoto,
    /// The grid was read, but some digits should be checked by hand.
    VerifyDigits,
    /// A setup problem (configuration, missing OCR engine) must be fixed.
    Setup,
}

/// A plain-language message with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether repeating the same request could succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `ScanError` into a `HumanError`.
pub fn humanize_error(err: &ScanError) -> HumanError {
    match err {
        ScanError::DecodeFailed(_) => HumanError {
            message: "That file isn't a picture we can open.".into(),
            suggestion: "Upload a JPEG or PNG photo of the puzzle.".into(),
            retriable: false,
            severity: Severity::RetakePhoto,
        },

        ScanError::NoGridFound => HumanError {
            message: "We couldn't find a Sudoku grid in the photo.".into(),
            suggestion: "Take a new photo with the whole puzzle in view and good lighting.".into(),
            retriable: false,
            severity: Severity::RetakePhoto,
        },

        ScanError::AmbiguousGrid { .. } | ScanError::NonConvexGrid => HumanError {
            message: "The edge of the puzzle isn't clear enough.".into(),
            suggestion: "Retake the photo straight on, with nothing covering the border and no other papers touching it.".into(),
            retriable: false,
            severity: Severity::RetakePhoto,
        },

        ScanError::DegenerateTransform => HumanError {
            message: "The puzzle is photographed at too steep an angle.".into(),
            suggestion: "Hold the camera above the puzzle and take the photo again.".into(),
            retriable: false,
            severity: Severity::RetakePhoto,
        },

        ScanError::Classifier(detail) => HumanError {
            message: "The digit reader isn't working.".into(),
            suggestion: format!("Check that the OCR engine is installed. ({detail})"),
            retriable: true,
            severity: Severity::Setup,
        },

        ScanError::Cancelled => HumanError {
            message: "The scan was stopped before it finished.".into(),
            suggestion: "Try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanError::InvalidConfig(detail) => HumanError {
            message: "The scanner settings are invalid.".into(),
            suggestion: format!("Fix the calibration profile and try again. ({detail})"),
            retriable: false,
            severity: Severity::Setup,
        },

        ScanError::Io(io) => HumanError {
            message: "A file couldn't be read or written.".into(),
            suggestion: format!("Check the file path and permissions. ({io})"),
            retriable: true,
            severity: Severity::Setup,
        },

        ScanError::Serialization(detail) => HumanError {
            message: "A settings file is not valid JSON.".into(),
            suggestion: format!("Fix the file and try again. ({detail})"),
            retriable: false,
            severity: Severity::Setup,
        },
    }
}

/// Confidence below which a successful parse should be checked by hand.
pub const VERIFY_BELOW: f64 = 0.9;

/// Advice for a successful parse, if its confidence is low.
pub fn humanize_confidence(result: &ParseResult) -> Option<HumanError> {
    if result.grid.filled_count() == 0 {
        return Some(HumanError {
            message: "No digits were found in the grid.".into(),
            suggestion: "If the puzzle has clues, take a sharper photo; otherwise enter them by hand.".into(),
            retriable: false,
            severity: Severity::VerifyDigits,
        });
    }
    if result.confidence < VERIFY_BELOW {
        return Some(HumanError {
            message: "Some digits could not be read.".into(),
            suggestion: format!(
                "Please check the grid against the puzzle ({:.0}% of the digits were read).",
                result.confidence * 100.0
            ),
            retriable: false,
            severity: Severity::VerifyDigits,
        });
    }
    None
}
