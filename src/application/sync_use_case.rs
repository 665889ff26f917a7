//! Sync use case: worksheet in, turnover figures out
//!
//! Reads the grid once, resolves and (if needed) migrates the schema, then
//! hands typed rows to the [`RowProcessor`].

use std::sync::Arc;

use tracing::info;

use crate::application::dto::RunReport;
use crate::application::row_processor::{RowPolicy, RowProcessor};
use crate::domain::{ColumnNames, DataStore, FetchClient, SheetSchema, SyncError};

pub struct TurnoverSync {
    fetcher: Arc<dyn FetchClient>,
    store: Arc<dyn DataStore>,
    columns: ColumnNames,
    policy: RowPolicy,
}

impl TurnoverSync {
    pub fn new(
        fetcher: Arc<dyn FetchClient>,
        store: Arc<dyn DataStore>,
        columns: ColumnNames,
        policy: RowPolicy,
    ) -> Self {
        Self {
            fetcher,
            store,
            columns,
            policy,
        }
    }

    /// Run one full pass over the worksheet.
    ///
    /// Only read, schema and header-write failures abort the run; every
    /// row-level failure is recorded in the returned report.
    pub async fn run(&self) -> Result<RunReport, SyncError> {
        let grid = self.store.read_all().await.map_err(SyncError::Read)?;
        info!("📄 Loaded {} data rows", grid.rows.len());

        let schema = SheetSchema::resolve(grid.header, &self.columns)?;
        if schema.migrated() {
            info!("➕ Adding missing '{}' column to header", self.columns.target);
            self.store
                .write_header(schema.header())
                .await
                .map_err(SyncError::HeaderWrite)?;
        }

        let mut rows = schema.records(grid.rows);
        let mut processor = RowProcessor::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.store),
            schema.layout(),
            self.policy.clone(),
        );

        Ok(processor.process_all(&mut rows).await)
    }
}
