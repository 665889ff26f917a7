//! Data transfer objects for the application layer

use serde::Serialize;

use crate::application::row_processor::{RowOutcome, SkipReason, ValueSource};

/// Aggregated outcomes of one run, in input-row order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    outcomes: Vec<RowOutcome>,
}

/// Counters derived from a [`RunReport`], suitable for structured logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub rows: usize,
    pub fetched: usize,
    pub cache_hits: usize,
    pub skipped_invalid: usize,
    pub skipped_filled: usize,
    pub failed: usize,
}

impl RunReport {
    pub fn new(capacity: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, outcome: RowOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[RowOutcome] {
        &self.outcomes
    }

    pub fn stats(&self) -> RunStats {
        let mut stats = RunStats {
            rows: self.outcomes.len(),
            ..RunStats::default()
        };
        for outcome in &self.outcomes {
            match outcome {
                RowOutcome::Skipped(SkipReason::Invalid) => stats.skipped_invalid += 1,
                RowOutcome::Skipped(SkipReason::AlreadyFilled) => stats.skipped_filled += 1,
                RowOutcome::Filled { source: ValueSource::Fetch, .. } => stats.fetched += 1,
                RowOutcome::Filled { source: ValueSource::Cache, .. } => stats.cache_hits += 1,
                RowOutcome::Failed(_) => stats.failed += 1,
            }
        }
        stats
    }
}
