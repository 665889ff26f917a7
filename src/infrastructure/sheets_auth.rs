//! Google Sheets credentials
//!
//! A service-account key file is the normal source: tokens are minted from
//! it and cached by `gcp_auth`, which refreshes them before they expire. A
//! fixed access token from configuration takes precedence when set.

use std::path::Path;

use anyhow::{Context, Result, bail};
use gcp_auth::{CustomServiceAccount, TokenProvider};
use tracing::info;

use crate::domain::PersistError;
use crate::infrastructure::config::SheetConfig;

/// OAuth scope for reading and writing spreadsheet values
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

pub enum SheetsAuth {
    /// Token supplied as-is; never refreshed
    AccessToken(String),
    ServiceAccount(CustomServiceAccount),
}

impl SheetsAuth {
    pub fn from_config(config: &SheetConfig) -> Result<Self> {
        let token = config.access_token.trim();
        if !token.is_empty() {
            info!("🔑 Using configured Sheets access token");
            return Ok(Self::AccessToken(token.to_string()));
        }
        Self::from_key_file(&config.service_account_path)
    }

    pub fn from_key_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            bail!("Service account key file {:?} not found", path);
        }
        let account = CustomServiceAccount::from_file(path)
            .with_context(|| format!("Invalid service account key file {:?}", path))?;
        info!("🔑 Using service account key {:?}", path);
        Ok(Self::ServiceAccount(account))
    }

    /// Bearer token for the next request.
    pub async fn bearer_token(&self) -> Result<String, PersistError> {
        match self {
            Self::AccessToken(token) => Ok(token.clone()),
            Self::ServiceAccount(account) => account
                .token(&[SPREADSHEETS_SCOPE])
                .await
                .map(|token| token.as_str().to_string())
                .map_err(|e| PersistError::Authentication {
                    message: e.to_string(),
                }),
        }
    }
}
