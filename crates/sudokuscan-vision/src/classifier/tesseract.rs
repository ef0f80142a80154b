// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract backend — runs the `tesseract` executable on one glyph at a time
// in single-character mode, restricted to the digits 1-9, and reads the
// per-word confidence from its TSV output.

use std::path::PathBuf;
use std::process::Command;

use image::{GrayImage, ImageFormat};
use sudokuscan_core::error::{Result, ScanError};
use sudokuscan_core::types::{DigitReading, first_digit};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use super::{DigitClassifier, render_glyph_page};

/// White border added around each glyph before recognition.
const DEFAULT_PADDING: u32 = 16;

/// Tesseract page segmentation mode "treat the image as a single character".
const PSM_SINGLE_CHAR: &str = "10";

/// Tesseract engine mode "LSTM only".
const OEM_LSTM: &str = "1";

const DIGIT_WHITELIST: &str = "tessedit_char_whitelist=123456789";

/// Digit classifier backed by the Tesseract command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractClassifier {
    executable: PathBuf,
    tessdata_dir: Option<PathBuf>,
    language: String,
    padding: u32,
}

impl Default for TesseractClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractClassifier {
    /// Use `tesseract` from `PATH` with the English model.
    pub fn new() -> Self {
        Self {
            executable: PathBuf::from("tesseract"),
            tessdata_dir: None,
            language: "eng".to_string(),
            padding: DEFAULT_PADDING,
        }
    }

    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tessdata_dir = Some(dir.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    fn command(&self, input: &std::path::Path) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(input).arg("stdout");
        if let Some(dir) = &self.tessdata_dir {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd.arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(PSM_SINGLE_CHAR)
            .arg("--oem")
            .arg(OEM_LSTM)
            .arg("-c")
            .arg(DIGIT_WHITELIST)
            .arg("tsv");
        cmd
    }
}

impl DigitClassifier for TesseractClassifier {
    fn name(&self) -> &str {
        "tesseract"
    }

    #[instrument(skip_all, fields(width = glyph.width(), height = glyph.height()))]
    fn recognize(&self, glyph: &GrayImage) -> Result<Option<DigitReading>> {
        let page = render_glyph_page(glyph, self.padding);

        let input = NamedTempFile::with_suffix(".png")?;
        page.save_with_format(input.path(), ImageFormat::Png)
            .map_err(|err| ScanError::Classifier(format!("failed to write glyph image: {err}")))?;

        let output = self.command(input.path()).output().map_err(|err| {
            ScanError::Classifier(format!(
                "failed to run {}: {err}",
                self.executable.display()
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScanError::Classifier(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let reading = parse_tsv_reading(&tsv);
        debug!(?reading, "Tesseract answered");
        Ok(reading)
    }
}

/// Pick the first word-level TSV row that contains a digit 1-9.
///
/// TSV fields: level, page_num, block_num, par_num, line_num, word_num,
/// left, top, width, height, conf, text. Confidence is reported as 0-100,
/// with -1 for "not available".
fn parse_tsv_reading(tsv: &str) -> Option<DigitReading> {
    for line in tsv.lines().skip(1) {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }
        // Level 5 = word
        if fields[0].trim() != "5" {
            continue;
        }
        let Some(digit) = first_digit(fields[11]) else {
            continue;
        };
        let confidence = fields[10]
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|c| *c >= 0.0)
            .map(|c| (c / 100.0).clamp(0.0, 1.0));
        return Some(DigitReading { digit, confidence });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn reads_digit_and_confidence() {
        let tsv = format!(
            "{HEADER}\n1\t1\t0\t0\t0\t0\t0\t0\t120\t120\t-1\t\n5\t1\t1\t1\t1\t1\t40\t30\t35\t60\t91.5\t7\n"
        );
        let reading = parse_tsv_reading(&tsv).expect("digit expected");
        assert_eq!(reading.digit.get(), 7);
        assert!((reading.confidence.unwrap() - 0.915).abs() < 1e-6);
    }

    #[test]
    fn missing_confidence_is_none() {
        let tsv = format!("{HEADER}\n5\t1\t1\t1\t1\t1\t40\t30\t35\t60\t-1\t4\n");
        let reading = parse_tsv_reading(&tsv).expect("digit expected");
        assert_eq!(reading.digit.get(), 4);
        assert!(reading.confidence.is_none());
    }

    #[test]
    fn empty_or_non_digit_output_is_no_reading() {
        assert!(parse_tsv_reading(HEADER).is_none());
        let tsv = format!("{HEADER}\n5\t1\t1\t1\t1\t1\t40\t30\t35\t60\t50\t|\n");
        assert!(parse_tsv_reading(&tsv).is_none());
    }

    #[test]
    fn missing_executable_is_a_classifier_error() {
        let classifier =
            TesseractClassifier::new().with_executable("/nonexistent/sudokuscan/tesseract");
        let glyph = GrayImage::new(20, 20);
        match classifier.recognize(&glyph) {
            Err(ScanError::Classifier(msg)) => assert!(msg.contains("failed to run")),
            other => panic!("expected classifier error, got {other:?}"),
        }
    }

    #[test]
    fn command_line_restricts_to_digits() {
        let classifier = TesseractClassifier::new().with_tessdata_dir("/opt/tessdata");
        let cmd = classifier.command(std::path::Path::new("/tmp/glyph.png"));
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args[0], "/tmp/glyph.png");
        assert_eq!(args[1], "stdout");
        assert!(args.windows(2).any(|w| w[0] == "--psm" && w[1] == "10"));
        assert!(args.windows(2).any(|w| w[0] == "-c" && w[1] == DIGIT_WHITELIST));
        assert!(args.windows(2).any(|w| w[0] == "--tessdata-dir" && w[1] == "/opt/tessdata"));
        assert_eq!(args.last().map(String::as_str), Some("tsv"));
    }
}
