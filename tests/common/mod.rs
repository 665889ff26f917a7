//! In-memory collaborators shared by the integration tests
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use turnover_sync::domain::{
    CellPosition, DataStore, FetchClient, FetchError, FetchedValue, Grid, PersistError,
};

/// Scripted fetcher recording every call in order.
#[derive(Default)]
pub struct StubFetcher {
    values: HashMap<String, FetchedValue>,
    failing: HashSet<String>,
    overlay_fails: bool,
    calls: Mutex<Vec<(String, String)>>,
    overlay_calls: Mutex<usize>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value returned for `record_id`; unknown ids get `NotFound`.
    pub fn with_value(mut self, record_id: &str, value: &str) -> Self {
        self.values
            .insert(record_id.to_string(), FetchedValue::Found(value.to_string()));
        self
    }

    pub fn failing_for(mut self, record_id: &str) -> Self {
        self.failing.insert(record_id.to_string());
        self
    }

    pub fn with_failing_overlay(mut self) -> Self {
        self.overlay_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn overlay_calls(&self) -> usize {
        *self.overlay_calls.lock().unwrap()
    }
}

#[async_trait]
impl FetchClient for StubFetcher {
    async fn fetch(&self, record_id: &str, slug: &str) -> Result<FetchedValue, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((record_id.to_string(), slug.to_string()));

        if self.failing.contains(record_id) {
            return Err(FetchError::Timeout {
                url: format!("https://app.endole.co.uk/company/{record_id}/{slug}"),
                timeout_secs: 30,
            });
        }
        Ok(self
            .values
            .get(record_id)
            .cloned()
            .unwrap_or(FetchedValue::NotFound))
    }

    async fn dismiss_overlay(&self) -> Result<(), FetchError> {
        *self.overlay_calls.lock().unwrap() += 1;
        if self.overlay_fails {
            return Err(FetchError::extraction("overlay did not close"));
        }
        Ok(())
    }
}

/// Grid held in memory; records header and cell writes in order.
#[derive(Default)]
pub struct MemoryStore {
    grid: Grid,
    read_fails: bool,
    failing_cells: HashSet<CellPosition>,
    header_writes: Mutex<Vec<Vec<String>>>,
    cell_writes: Mutex<Vec<(CellPosition, String)>>,
}

impl MemoryStore {
    pub fn new(header: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            grid: Grid {
                header: to_strings(header),
                rows: rows.iter().map(|r| to_strings(r)).collect(),
            },
            ..Self::default()
        }
    }

    pub fn failing_read(mut self) -> Self {
        self.read_fails = true;
        self
    }

    pub fn failing_at(mut self, position: CellPosition) -> Self {
        self.failing_cells.insert(position);
        self
    }

    pub fn header_writes(&self) -> Vec<Vec<String>> {
        self.header_writes.lock().unwrap().clone()
    }

    pub fn cell_writes(&self) -> Vec<(CellPosition, String)> {
        self.cell_writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn read_all(&self) -> Result<Grid, PersistError> {
        if self.read_fails {
            return Err(PersistError::Transport {
                range: "'Parent'".to_string(),
                message: "connection reset".to_string(),
            });
        }
        Ok(self.grid.clone())
    }

    async fn write_header(&self, header: &[String]) -> Result<(), PersistError> {
        self.header_writes.lock().unwrap().push(header.to_vec());
        Ok(())
    }

    async fn write_cell(&self, position: CellPosition, value: &str) -> Result<(), PersistError> {
        if self.failing_cells.contains(&position) {
            return Err(PersistError::Http {
                status: 403,
                range: position.a1(),
                message: "protected range".to_string(),
            });
        }
        self.cell_writes
            .lock()
            .unwrap()
            .push((position, value.to_string()));
        Ok(())
    }
}

pub fn to_strings(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

pub const ID: &str = "Companies House Regestration Number";
pub const NAME: &str = "Company";
pub const TARGET: &str = "Individual Turnover";
