// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the sudokuscan grid reader.

use serde::{Deserialize, Serialize};

/// Number of rows (and columns) in a Sudoku grid.
pub const GRID_SIZE: usize = 9;

/// Number of cells in a Sudoku grid.
pub const CELL_COUNT: usize = GRID_SIZE * GRID_SIZE;

/// A 2-D point in image coordinates, `(x, y)`.
pub type Point2 = (f32, f32);

// -- Digits -------------------------------------------------------------------

/// A Sudoku clue digit, always in `1..=9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Digit(u8);

impl Digit {
    /// Wrap a value, rejecting anything outside `1..=9`.
    pub fn new(value: u8) -> Option<Self> {
        (1..=9).contains(&value).then_some(Self(value))
    }

    /// Parse a single character. Only `'1'..='9'` are digits; `'0'` never is.
    pub fn from_char(ch: char) -> Option<Self> {
        ch.to_digit(10).and_then(|d| Self::new(d as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Digit {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("{value} is not a Sudoku digit (1-9)"))
    }
}

impl From<Digit> for u8 {
    fn from(digit: Digit) -> Self {
        digit.0
    }
}

impl std::fmt::Display for Digit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extract the first Sudoku digit from free-form classifier text.
///
/// Everything that is not `'1'..='9'` is ignored, including `'0'`.
pub fn first_digit(text: &str) -> Option<Digit> {
    text.chars().find_map(Digit::from_char)
}

// -- Cells --------------------------------------------------------------------

/// Position of a cell in the 9×9 lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellIndex {
    pub row: usize,
    pub col: usize,
}

impl CellIndex {
    pub fn new(row: usize, col: usize) -> Option<Self> {
        (row < GRID_SIZE && col < GRID_SIZE).then_some(Self { row, col })
    }

    /// Row-major position in `0..81`.
    pub fn linear(self) -> usize {
        self.row * GRID_SIZE + self.col
    }

    /// Inverse of [`linear`](Self::linear).
    pub fn from_linear(index: usize) -> Option<Self> {
        Self::new(index / GRID_SIZE, index % GRID_SIZE)
    }

    /// All 81 cells in row-major order.
    pub fn all() -> impl Iterator<Item = CellIndex> {
        (0..CELL_COUNT).map(|i| CellIndex {
            row: i / GRID_SIZE,
            col: i % GRID_SIZE,
        })
    }
}

impl std::fmt::Display for CellIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

// -- Recognition --------------------------------------------------------------

/// A single classifier answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DigitReading {
    pub digit: Digit,
    /// The classifier's own certainty in `[0, 1]`, if it reports one.
    pub confidence: Option<f32>,
}

impl DigitReading {
    pub fn new(digit: Digit) -> Self {
        Self {
            digit,
            confidence: None,
        }
    }

    pub fn with_confidence(digit: Digit, confidence: f32) -> Self {
        Self {
            digit,
            confidence: Some(confidence),
        }
    }
}

/// What happened to one cell.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum RecognitionOutcome {
    /// Too little ink after cleanup; never sent to the classifier.
    #[default]
    Blank,
    /// A glyph was found and the classifier named a digit.
    Recognized(DigitReading),
    /// A glyph was found but the classifier returned no digit (or failed).
    Unreadable,
}

impl RecognitionOutcome {
    /// Whether the cell held a glyph and was sent to the classifier.
    pub fn glyph_detected(&self) -> bool {
        !matches!(self, RecognitionOutcome::Blank)
    }

    pub fn digit(&self) -> Option<Digit> {
        match self {
            RecognitionOutcome::Recognized(reading) => Some(reading.digit),
            _ => None,
        }
    }

    /// The confidence sample this cell contributes, or `None` for blanks.
    ///
    /// A recognised cell contributes the classifier's own confidence when it
    /// reports one, and `1.0` otherwise. An unreadable cell contributes `0.0`.
    pub fn confidence_sample(&self) -> Option<f64> {
        match self {
            RecognitionOutcome::Blank => None,
            RecognitionOutcome::Recognized(reading) => Some(
                match reading.confidence {
                    None => 1.0,
                    Some(c) if c.is_nan() => 0.0,
                    Some(c) => f64::from(c).clamp(0.0, 1.0),
                },
            ),
            RecognitionOutcome::Unreadable => Some(0.0),
        }
    }
}

// -- Geometry -----------------------------------------------------------------

/// Four corners ordered `[top_left, top_right, bottom_right, bottom_left]`.
///
/// Ordering is derived from the coordinates, not from detection order:
/// top-left has the smallest `x + y`, bottom-right the largest, top-right the
/// largest `x - y` (smallest `y - x`) and bottom-left the smallest. This is
/// only meaningful for a convex quadrilateral that is not rotated close to
/// 45°; callers must check [`is_convex`](Self::is_convex) before trusting
/// the result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    corners: [Point2; 4],
}

impl Quadrilateral {
    /// Order four points canonically, whatever order they arrive in.
    pub fn from_unordered(points: [Point2; 4]) -> Self {
        let sum = |p: &Point2| p.0 + p.1;
        let diff = |p: &Point2| p.0 - p.1;

        let pick = |key: &dyn Fn(&Point2) -> f32, largest: bool| -> Point2 {
            let mut best = points[0];
            for p in &points[1..] {
                let better = if largest {
                    key(p) > key(&best)
                } else {
                    key(p) < key(&best)
                };
                if better {
                    best = *p;
                }
            }
            best
        };

        Self {
            corners: [
                pick(&sum, false),
                pick(&diff, true),
                pick(&sum, true),
                pick(&diff, false),
            ],
        }
    }

    pub fn corners(&self) -> [Point2; 4] {
        self.corners
    }

    pub fn top_left(&self) -> Point2 {
        self.corners[0]
    }

    pub fn top_right(&self) -> Point2 {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> Point2 {
        self.corners[2]
    }

    pub fn bottom_left(&self) -> Point2 {
        self.corners[3]
    }

    /// Enclosed area via the shoelace formula.
    pub fn area(&self) -> f32 {
        shoelace_area(&self.corners)
    }

    /// True when every turn along the boundary has the same, non-zero sign.
    ///
    /// Also rejects orderings that picked the same point twice.
    pub fn is_convex(&self) -> bool {
        let mut sign = 0.0f32;
        for i in 0..4 {
            let a = self.corners[i];
            let b = self.corners[(i + 1) % 4];
            let c = self.corners[(i + 2) % 4];
            let cross = (b.0 - a.0) * (c.1 - b.1) - (b.1 - a.1) * (c.0 - b.0);
            if cross.abs() <= f32::EPSILON {
                return false;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }
}

/// Unsigned area enclosed by a simple polygon given as a closed vertex ring.
///
/// Winding direction does not matter; fewer than three vertices enclose nothing.
pub fn shoelace_area(corners: &[Point2]) -> f32 {
    let Some(&last) = corners.last() else {
        return 0.0;
    };
    let twice: f32 = corners
        .iter()
        .scan(last, |prev, &p| {
            let term = prev.0 * p.1 - p.0 * prev.1;
            *prev = p;
            Some(term)
        })
        .sum();
    twice.abs() / 2.0
}

// -- Results ------------------------------------------------------------------

/// Row-major cell values of a [`Grid`].
pub type GridRows = [[u8; GRID_SIZE]; GRID_SIZE];

/// A 9×9 matrix of digits, `0` meaning empty or unrecognised.
///
/// Every cell holds `0..=9`; deserialization rejects anything larger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "GridRows", into = "GridRows")]
pub struct Grid(GridRows);

impl Grid {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a grid from per-cell outcomes; anything but a recognised digit is `0`.
    pub fn from_outcomes(outcomes: &[[RecognitionOutcome; GRID_SIZE]; GRID_SIZE]) -> Self {
        let mut rows = [[0u8; GRID_SIZE]; GRID_SIZE];
        for (r, row) in outcomes.iter().enumerate() {
            for (c, outcome) in row.iter().enumerate() {
                rows[r][c] = outcome.digit().map(Digit::get).unwrap_or(0);
            }
        }
        Self(rows)
    }

    pub fn get(&self, index: CellIndex) -> u8 {
        self.0[index.row][index.col]
    }

    pub fn rows(&self) -> &[[u8; GRID_SIZE]; GRID_SIZE] {
        &self.0
    }

    /// Number of non-zero cells.
    pub fn filled_count(&self) -> usize {
        self.0.iter().flatten().filter(|&&v| v != 0).count()
    }
}

impl TryFrom<GridRows> for Grid {
    type Error = String;

    fn try_from(rows: GridRows) -> Result<Self, Self::Error> {
        for (r, row) in rows.iter().enumerate() {
            if let Some(c) = row.iter().position(|&v| v > 9) {
                return Err(format!(
                    "cell ({r}, {c}) holds {}, expected 0 (empty) or a digit 1-9",
                    row[c]
                ));
            }
        }
        Ok(Self(rows))
    }
}

impl From<Grid> for GridRows {
    fn from(grid: Grid) -> Self {
        grid.0
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (r, row) in self.0.iter().enumerate() {
            if r > 0 {
                writeln!(f)?;
            }
            let line: Vec<String> = row
                .iter()
                .map(|&v| if v == 0 { ".".to_string() } else { v.to_string() })
                .collect();
            write!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

/// The answer handed back to the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub grid: Grid,
    /// Mean recognition success over attempted cells, in `[0, 1]`.
    pub confidence: f64,
}

impl ParseResult {
    /// Confidence rounded to three decimals.
    pub fn rounded_confidence(&self) -> f64 {
        (self.confidence * 1000.0).round() / 1000.0
    }

    /// Copy with the confidence rounded to three decimals, ready to serialize.
    pub fn rounded(&self) -> Self {
        Self {
            grid: self.grid,
            confidence: self.rounded_confidence(),
        }
    }
}
