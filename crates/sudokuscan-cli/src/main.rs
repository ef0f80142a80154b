// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// sudokuscan — Read a Sudoku grid from a photograph.
//
// Entry point. Initialises logging, loads the calibration profile, builds the
// digit classifier, and prints the scanned grid as JSON on stdout. Logs and
// human-readable advice go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use sudokuscan_core::error::{Result, ScanError};
use sudokuscan_core::human_errors::{HumanError, humanize_confidence, humanize_error};
use sudokuscan_core::{ParseResult, ScanConfig};
use sudokuscan_vision::{DigitClassifier, SudokuScanner, TesseractClassifier, decode_image};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sudokuscan")]
#[command(about = "Extract a 9x9 Sudoku grid and a confidence score from a photograph")]
#[command(version)]
struct Cli {
    /// Path to the photograph (PNG, JPEG, ...).
    image: PathBuf,

    /// Calibration profile (JSON). Missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Canonical square side in pixels; must be a multiple of 9.
    #[arg(long)]
    side: Option<u32>,

    /// Recognise cells one at a time instead of in parallel.
    #[arg(long)]
    sequential: bool,

    /// Digit recognition engine.
    #[arg(long, value_enum, default_value_t = Engine::Tesseract)]
    engine: Engine,

    /// Path to the `tesseract` executable.
    #[arg(long, default_value = "tesseract")]
    tesseract: PathBuf,

    /// Directory holding Tesseract language data.
    #[arg(long)]
    tessdata_dir: Option<PathBuf>,

    /// Directory holding the ocrs models (defaults to the ocrs cache).
    #[arg(long)]
    ocrs_models: Option<PathBuf>,

    /// Also write the rectified, binarized grid to this PNG.
    #[arg(long)]
    dump_canonical: Option<PathBuf>,

    /// Pretty-print the JSON result.
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Engine {
    Tesseract,
    Ocrs,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(result) => {
            if let Some(advice) = humanize_confidence(&result) {
                report(&advice);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Scan failed");
            report(&humanize_error(&err));
            if err.is_fatal_geometry() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: &Cli) -> Result<ParseResult> {
    let config = load_config(cli)?;
    let scanner = SudokuScanner::new(config, build_classifier(cli)?)?;
    info!(
        image = %cli.image.display(),
        side = scanner.config().rectify.side,
        classifier = scanner.classifier().name(),
        "sudokuscan starting"
    );

    let bytes = std::fs::read(&cli.image)?;
    let image = decode_image(&bytes)?;

    if let Some(path) = &cli.dump_canonical {
        dump_canonical(&scanner, &image, path)?;
    }

    let result = scanner.scan(&image)?.rounded();
    let json = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{json}");
    Ok(result)
}

fn load_config(cli: &Cli) -> Result<ScanConfig> {
    let mut config = match &cli.config {
        Some(path) => ScanConfig::from_json_file(path)?,
        None => ScanConfig::default(),
    };
    if let Some(side) = cli.side {
        config = config.with_side(side);
    }
    if cli.sequential {
        config.extract.parallel = false;
    }
    Ok(config)
}

fn build_classifier(cli: &Cli) -> Result<Box<dyn DigitClassifier>> {
    match cli.engine {
        Engine::Tesseract => {
            let mut tesseract = TesseractClassifier::new().with_executable(&cli.tesseract);
            if let Some(dir) = &cli.tessdata_dir {
                tesseract = tesseract.with_tessdata_dir(dir);
            }
            Ok(Box::new(tesseract))
        }
        Engine::Ocrs => build_ocrs(cli.ocrs_models.as_deref()),
    }
}

#[cfg(feature = "ocr")]
fn build_ocrs(models: Option<&Path>) -> Result<Box<dyn DigitClassifier>> {
    use sudokuscan_vision::{OcrConfig, OcrsClassifier};

    let config = models.map(OcrConfig::from_dir).unwrap_or_default();
    Ok(Box::new(OcrsClassifier::new(config)?))
}

#[cfg(not(feature = "ocr"))]
fn build_ocrs(_models: Option<&Path>) -> Result<Box<dyn DigitClassifier>> {
    Err(ScanError::InvalidConfig(
        "the ocrs engine is not compiled in; rebuild with `--features ocr`".into(),
    ))
}

fn dump_canonical<C: DigitClassifier>(
    scanner: &SudokuScanner<C>,
    image: &image::DynamicImage,
    path: &Path,
) -> Result<()> {
    let canonical = scanner.rectify_only(image)?;
    canonical
        .into_image()
        .save(path)
        .map_err(|err| ScanError::Io(std::io::Error::other(err)))?;
    info!(path = %path.display(), "Canonical grid written");
    Ok(())
}

fn report(advice: &HumanError) {
    eprintln!("{}", advice.message);
    eprintln!("{}", advice.suggestion);
}
