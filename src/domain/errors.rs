//! Error taxonomy for a sync run
//!
//! Row-level errors (`FetchError`, `PersistError`) are isolated to the row
//! that produced them. `SchemaError` and the other `SyncError` variants stop
//! the run before any row is processed.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Page {url} did not finish loading within {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("Login failed: {message}")]
    Authentication { message: String },

    #[error("Extraction failed: {message}")]
    Extraction { message: String },
}

impl FetchError {
    pub fn navigation(url: &str, message: impl std::fmt::Display) -> Self {
        Self::Navigation {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    pub fn extraction(message: impl std::fmt::Display) -> Self {
        Self::Extraction {
            message: message.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistError {
    #[error("Sheets API returned {status} for {range}: {message}")]
    Http {
        status: u16,
        range: String,
        message: String,
    },

    #[error("Sheets request for {range} failed: {message}")]
    Transport { range: String, message: String },

    #[error("Unexpected Sheets response: {message}")]
    InvalidResponse { message: String },

    #[error("Could not obtain a Sheets access token: {message}")]
    Authentication { message: String },
}

impl PersistError {
    /// Whether a retry of the same request could succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Transport { .. } | Self::Authentication { .. } => true,
            Self::InvalidResponse { .. } => false,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Required column '{column}' not found in header {header:?}")]
    MissingColumn { column: String, header: Vec<String> },

    #[error("Worksheet has no header row")]
    EmptySheet,
}

/// Failures that abort the whole run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Failed to read worksheet: {0}")]
    Read(#[source] PersistError),

    #[error("Failed to rewrite header row: {0}")]
    HeaderWrite(#[source] PersistError),
}
