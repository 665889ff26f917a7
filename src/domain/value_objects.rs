//! # Domain Value Objects
//!
//! Immutable value types that represent concepts in the sync domain.
//! Value objects are defined by their attributes rather than identity.

use serde::{Deserialize, Serialize};

/// Text written to the sheet when a fetch completed but found no figure.
pub const NOT_FOUND_SENTINEL: &str = "N/A";

/// Result of a completed fetch.
///
/// `NotFound` means the page loaded but carried no turnover figure. It is a
/// valid, cacheable answer and is distinct from "not yet attempted", which is
/// an empty target cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchedValue {
    Found(String),
    NotFound,
}

impl FetchedValue {
    /// Build a value from extracted text; blank text counts as not found.
    #[must_use]
    pub fn from_extracted(text: Option<&str>) -> Self {
        match text.map(str::trim) {
            Some(t) if !t.is_empty() => Self::Found(t.to_string()),
            _ => Self::NotFound,
        }
    }

    /// Text to persist into the target cell.
    #[must_use]
    pub fn cell_text(&self) -> &str {
        match self {
            Self::Found(value) => value,
            Self::NotFound => NOT_FOUND_SENTINEL,
        }
    }
}

impl std::fmt::Display for FetchedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.cell_text())
    }
}

/// Absolute, 1-based cell coordinate in the external grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellPosition {
    pub row: u32,
    pub column: u32,
}

impl CellPosition {
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Spreadsheet column letters for this position (`1 → A`, `27 → AA`).
    #[must_use]
    pub fn column_letters(&self) -> String {
        let mut n = self.column;
        let mut letters = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push(char::from(b'A' + rem as u8));
            n = (n - 1) / 26;
        }
        letters.iter().rev().collect()
    }

    /// A1 notation, e.g. `C12`.
    #[must_use]
    pub fn a1(&self) -> String {
        format!("{}{}", self.column_letters(), self.row)
    }
}

impl std::fmt::Display for CellPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.a1())
    }
}
