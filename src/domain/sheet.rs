//! Worksheet schema, typed company rows and grid coordinates
//!
//! The raw grid is turned into fixed-width [`CompanyRow`] records exactly
//! once, after the header has been resolved and, if needed, migrated to
//! include the target column.

use serde::{Deserialize, Serialize};

use crate::domain::errors::SchemaError;
use crate::domain::value_objects::CellPosition;

/// Number of rows above the first data row.
pub const HEADER_ROWS: usize = 1;

/// Column names the run depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnNames {
    pub identifier: String,
    pub name: String,
    pub target: String,
}

/// 0-based offsets of the columns of interest, fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub identifier: usize,
    pub name: usize,
    pub target: usize,
}

/// Map an in-memory data row index and a 0-based column offset to the
/// absolute 1-based cell in the external grid.
pub fn cell_position(row_index: usize, column_offset: usize) -> CellPosition {
    CellPosition::new(
        (row_index + HEADER_ROWS + 1) as u32,
        (column_offset + 1) as u32,
    )
}

/// Resolved header plus column layout.
#[derive(Debug, Clone)]
pub struct SheetSchema {
    header: Vec<String>,
    layout: ColumnLayout,
    migrated: bool,
}

impl SheetSchema {
    /// Resolve column offsets from the header.
    ///
    /// The identifier and name columns must exist. A missing target column is
    /// appended and the schema is flagged as migrated, so the caller rewrites
    /// the header before processing rows.
    pub fn resolve(mut header: Vec<String>, names: &ColumnNames) -> Result<Self, SchemaError> {
        if header.is_empty() {
            return Err(SchemaError::EmptySheet);
        }

        let identifier = find_column(&header, &names.identifier)?;
        let name = find_column(&header, &names.name)?;

        let (target, migrated) = match header.iter().position(|h| h == &names.target) {
            Some(idx) => (idx, false),
            None => {
                header.push(names.target.clone());
                (header.len() - 1, true)
            }
        };

        Ok(Self {
            header,
            layout: ColumnLayout {
                identifier,
                name,
                target,
            },
            migrated,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn layout(&self) -> ColumnLayout {
        self.layout
    }

    /// True when the target column was appended during resolution.
    pub fn migrated(&self) -> bool {
        self.migrated
    }

    /// Build typed records, padding short rows to the header width.
    pub fn records(&self, rows: Vec<Vec<String>>) -> Vec<CompanyRow> {
        let width = self.header.len();
        rows.into_iter()
            .enumerate()
            .map(|(index, mut cells)| {
                if cells.len() < width {
                    cells.resize(width, String::new());
                }
                CompanyRow {
                    index,
                    record_id: cells[self.layout.identifier].clone(),
                    display_name: cells[self.layout.name].clone(),
                    target: cells[self.layout.target].clone(),
                }
            })
            .collect()
    }
}

fn find_column(header: &[String], column: &str) -> Result<usize, SchemaError> {
    header
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| SchemaError::MissingColumn {
            column: column.to_string(),
            header: header.to_vec(),
        })
}

/// One data row, reduced to the cells the run reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRow {
    /// Position among data rows, 0-based, header excluded.
    pub index: usize,
    pub record_id: String,
    pub display_name: String,
    pub target: String,
}

impl CompanyRow {
    /// 1-based row number as shown in the spreadsheet UI.
    pub fn sheet_row(&self) -> usize {
        self.index + HEADER_ROWS + 1
    }
}
