//! Collaborator interfaces consumed by the row processor
//!
//! The core never talks to Endole or Google Sheets directly; it goes
//! through these traits so it can be driven by stubs in tests.

use async_trait::async_trait;

use crate::domain::errors::{FetchError, PersistError};
use crate::domain::value_objects::{CellPosition, FetchedValue};

/// Full worksheet contents: first row as header, the rest as data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[async_trait]
pub trait FetchClient: Send + Sync {
    /// Load the company page for `(record_id, slug)` and extract the figure.
    ///
    /// Returns `FetchedValue::NotFound` when the page loaded but the figure
    /// is absent; fails only when navigation or loading does not complete.
    async fn fetch(&self, record_id: &str, slug: &str) -> Result<FetchedValue, FetchError>;

    /// Best-effort cleanup of client-side UI state after a row is written.
    async fn dismiss_overlay(&self) -> Result<(), FetchError> {
        Ok(())
    }
}

#[async_trait]
pub trait DataStore: Send + Sync {
    async fn read_all(&self) -> Result<Grid, PersistError>;
    async fn write_header(&self, header: &[String]) -> Result<(), PersistError>;
    async fn write_cell(&self, position: CellPosition, value: &str) -> Result<(), PersistError>;
}
