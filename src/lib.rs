//! Turnover Sync
//!
//! Fills the "Individual Turnover" column of a Google Sheet of companies by
//! looking each company up on Endole. Rows that already have a value are
//! left alone, repeated companies are fetched once per run, and a failure
//! on one row never stops the rows after it.

pub mod application;
pub mod domain;
pub mod infrastructure;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::application::{RowPolicy, RunStats, TurnoverSync};
use crate::infrastructure::{AppConfig, EndoleClient, GoogleSheetsStore};

/// Connect to Endole and the spreadsheet, then run one sync pass.
pub async fn run(config: AppConfig) -> Result<RunStats> {
    config.validate_credentials()?;

    let run_id = Uuid::new_v4();
    let span = info_span!("sync", run_id = %run_id);

    async move {
        info!("🚀 Starting turnover sync for worksheet '{}'", config.sheet.worksheet);

        let fetcher = EndoleClient::connect(&config.fetch).await?;
        let store = GoogleSheetsStore::new(&config.sheet)?;
        let policy = RowPolicy {
            null_markers: config.columns.null_markers.clone(),
            pacing: Duration::from_millis(config.pacing.write_delay_ms),
        };

        let sync = TurnoverSync::new(
            Arc::new(fetcher),
            Arc::new(store),
            config.columns.names(),
            policy,
        );
        let report = sync.run().await?;
        let stats = report.stats();

        info!(
            rows = stats.rows,
            fetched = stats.fetched,
            cache_hits = stats.cache_hits,
            skipped_invalid = stats.skipped_invalid,
            skipped_filled = stats.skipped_filled,
            failed = stats.failed,
            "🏁 Sync finished"
        );
        Ok::<_, anyhow::Error>(stats)
    }
    .instrument(span)
    .await
}
