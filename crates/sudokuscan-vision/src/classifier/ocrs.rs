// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ocrs backend — digit recognition with the pure-Rust `ocrs` engine, whose
// neural network models run on `rten`.
//
// # Feature Gate
//
// Only compiled with the `ocr` feature:
//
// ```toml
// sudokuscan-vision = { path = "crates/sudokuscan-vision", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine needs `text-detection.rten` and `text-recognition.rten`. Running
// `ocrs-cli` once downloads both to `$XDG_CACHE_HOME/ocrs` (typically
// `~/.cache/ocrs`), which is where [`OcrConfig::default`] looks.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use sudokuscan_core::error::{Result, ScanError};
use sudokuscan_core::types::{DigitReading, first_digit};
use tracing::{debug, info, instrument};

use super::{DigitClassifier, render_glyph_page};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Detection works poorly on tight crops, so glyphs get a generous border.
const GLYPH_PADDING: u32 = 32;

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Where to find the two `ocrs` model files.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Both models inside `dir`, under their well-known filenames.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for (kind, path) in [
            ("detection", &self.detection_model_path),
            ("recognition", &self.recognition_model_path),
        ] {
            if !path.exists() {
                return Err(ScanError::Classifier(format!(
                    "{kind} model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Digit classifier backed by `ocrs`.
///
/// Model loading is the expensive step; build one classifier and reuse it for
/// every cell of every scan.
pub struct OcrsClassifier {
    engine: OcrEngine,
}

impl OcrsClassifier {
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrConfig) -> Result<Self> {
        config.validate()?;

        let load = |path: &Path| {
            Model::load_file(path).map_err(|err| {
                ScanError::Classifier(format!(
                    "failed to load model from {}: {err}",
                    path.display()
                ))
            })
        };
        info!("Loading OCR models");
        let detection_model = load(&config.detection_model_path)?;
        let recognition_model = load(&config.recognition_model_path)?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| ScanError::Classifier(format!("failed to initialise OCR engine: {err}")))?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(OcrConfig::default())
    }
}

impl DigitClassifier for OcrsClassifier {
    fn name(&self) -> &str {
        "ocrs"
    }

    #[instrument(skip_all, fields(width = glyph.width(), height = glyph.height()))]
    fn recognize(&self, glyph: &GrayImage) -> Result<Option<DigitReading>> {
        let page = render_glyph_page(glyph, GLYPH_PADDING);
        let rgb = DynamicImage::ImageLuma8(page).to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            ScanError::Classifier(format!(
                "failed to create image source ({width}x{height}): {err}"
            ))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| ScanError::Classifier(format!("OCR preprocessing failed: {err}")))?;
        let text = self
            .engine
            .get_text(&input)
            .map_err(|err| ScanError::Classifier(format!("OCR recognition failed: {err}")))?;

        let reading = first_digit(&text).map(DigitReading::new);
        debug!(text = %text.trim(), ?reading, "ocrs answered");
        Ok(reading)
    }
}
