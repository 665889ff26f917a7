//! Per-row decision pipeline
//!
//! For each row, in order: invalid check → already-filled check → identity
//! → cache lookup → fetch on miss → write → overlay cleanup → pacing.
//! Every row ends in exactly one [`RowOutcome`]; failures never escape the
//! row that produced them.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::application::dto::RunReport;
use crate::domain::{
    ColumnLayout, CompanyRow, DataStore, FetchClient, FetchError, FetchedValue, Identity,
    IdentityCache, PersistError, cell_position,
};

/// Row-level knobs taken from configuration.
#[derive(Debug, Clone)]
pub struct RowPolicy {
    /// Identifier tokens treated as missing, compared case-insensitively.
    pub null_markers: Vec<String>,
    /// Wait after every successful write.
    pub pacing: Duration,
}

impl RowPolicy {
    pub fn is_null_marker(&self, record_id: &str) -> bool {
        self.null_markers
            .iter()
            .any(|marker| marker.trim().eq_ignore_ascii_case(record_id))
    }
}

impl Default for RowPolicy {
    fn default() -> Self {
        Self {
            null_markers: vec!["nan".to_string()],
            pacing: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Missing identifier or name, or a null-marker identifier.
    Invalid,
    /// Target cell already holds a value.
    AlreadyFilled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Cache,
    Fetch,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Skipped(SkipReason),
    Filled {
        value: FetchedValue,
        source: ValueSource,
    },
    Failed(RowError),
}

/// Sequential row processor owning the per-run identity cache.
pub struct RowProcessor {
    fetcher: Arc<dyn FetchClient>,
    store: Arc<dyn DataStore>,
    cache: IdentityCache,
    layout: ColumnLayout,
    policy: RowPolicy,
}

impl RowProcessor {
    pub fn new(
        fetcher: Arc<dyn FetchClient>,
        store: Arc<dyn DataStore>,
        layout: ColumnLayout,
        policy: RowPolicy,
    ) -> Self {
        Self {
            fetcher,
            store,
            cache: IdentityCache::new(),
            layout,
            policy,
        }
    }

    pub fn cache(&self) -> &IdentityCache {
        &self.cache
    }

    /// Process rows strictly in order and collect their outcomes.
    pub async fn process_all(&mut self, rows: &mut [CompanyRow]) -> RunReport {
        let mut report = RunReport::new(rows.len());
        for row in rows.iter_mut() {
            let outcome = self.process_row(row).await;
            report.record(outcome);
        }
        report
    }

    /// Run the decision pipeline for a single row.
    ///
    /// On success the row's in-memory target cell is updated to the value
    /// that was written.
    pub async fn process_row(&mut self, row: &mut CompanyRow) -> RowOutcome {
        let sheet_row = row.sheet_row();
        let record_id = row.record_id.trim();
        let display_name = row.display_name.trim();

        let invalid = record_id.is_empty()
            || display_name.is_empty()
            || self.policy.is_null_marker(record_id);
        if invalid {
            info!("⏭️  Skipping invalid row {}", sheet_row);
            return RowOutcome::Skipped(SkipReason::Invalid);
        }
        if !row.target.trim().is_empty() {
            info!("⏭️  Skipping row {}, already has data", sheet_row);
            return RowOutcome::Skipped(SkipReason::AlreadyFilled);
        }

        let identity = Identity::from_row(record_id, display_name);

        let (value, source) = match self.cache.get(&identity).cloned() {
            Some(cached) => {
                info!("🎯 Cached → Turnover: {} ({})", cached, identity);
                (cached, ValueSource::Cache)
            }
            None => match self.fetcher.fetch(identity.record_id(), identity.slug()).await {
                Ok(fetched) => {
                    info!("✅ Scraped → Turnover: {} ({})", fetched, identity);
                    self.cache.put(identity, fetched.clone());
                    (fetched, ValueSource::Fetch)
                }
                Err(e) => {
                    error!("❌ Error at row {}: {}", sheet_row, e);
                    return RowOutcome::Failed(e.into());
                }
            },
        };

        let position = cell_position(row.index, self.layout.target);
        if let Err(e) = self.store.write_cell(position, value.cell_text()).await {
            error!("❌ Error at row {}: {}", sheet_row, e);
            return RowOutcome::Failed(e.into());
        }
        row.target = value.cell_text().to_string();
        info!("📝 Updated row {} in sheet ({}).", sheet_row, position);

        if let Err(e) = self.fetcher.dismiss_overlay().await {
            debug!("Overlay dismissal after row {} failed: {}", sheet_row, e);
        }

        if !self.policy.pacing.is_zero() {
            tokio::time::sleep(self.policy.pacing).await;
        }

        RowOutcome::Filled { value, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_marker_is_case_insensitive() {
        let policy = RowPolicy {
            null_markers: vec!["nan".into(), "N/A".into()],
            pacing: Duration::ZERO,
        };
        assert!(policy.is_null_marker("NaN"));
        assert!(policy.is_null_marker("n/a"));
        assert!(!policy.is_null_marker("12345678"));
        assert!(!policy.is_null_marker("nano"));
    }

    #[test]
    fn test_default_policy() {
        let policy = RowPolicy::default();
        assert!(policy.is_null_marker("NAN"));
        assert_eq!(policy.pacing, Duration::from_secs(1));
    }
}
