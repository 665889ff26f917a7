//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate, later sources winning:
//!
//! 1. built-in defaults ([`AppConfig::default`])
//! 2. `config/default.*`, the user config dir, then `config/local.*` (all optional)
//! 3. an explicit file (first CLI argument or `TURNOVER_SYNC_CONFIG`)
//! 4. `TURNOVER_SYNC__<SECTION>__<KEY>` environment variables
//! 5. the legacy `ENDOLE_*` / `GOOGLE_*` variables for credentials

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::domain::ColumnNames;
use crate::infrastructure::http_client::HttpClientConfig;
use crate::infrastructure::retry_policy::RetryPolicy;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    FileLoad {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },

    #[error("Unrecognized argument '{argument}' (usage: turnover-sync [CONFIG_FILE])")]
    UnknownArgument { argument: String },
}

impl ConfigError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sheet: SheetConfig,
    pub columns: ColumnConfig,
    pub fetch: FetchConfig,
    pub pacing: PacingConfig,
    pub logging: LoggingConfig,
}

/// Google Sheets settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    pub spreadsheet_id: String,

    /// Worksheet (tab) name
    pub worksheet: String,

    /// Service-account key used to mint access tokens
    pub service_account_path: PathBuf,

    /// Fixed OAuth bearer token; overrides the service account when set
    pub access_token: String,

    pub api_base_url: String,

    pub request_timeout_seconds: u64,

    /// Retries for 429 / 5xx / dropped connections on each Sheets call
    pub retry: RetryPolicy,
}

/// Column names and row validity rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub identifier: String,
    pub name: String,
    pub target: String,

    /// Identifier values treated as missing (case-insensitive)
    pub null_markers: Vec<String>,
}

/// Endole session and page loading
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub base_url: String,
    pub login_path: String,
    pub email: String,
    pub password: String,
    pub user_agent: String,

    /// Upper bound for a company page to finish loading
    pub load_timeout_seconds: u64,

    pub max_requests_per_second: u32,

    /// Transport retries inside one page load; a failed row is never retried
    pub retry: RetryPolicy,
}

/// Throttling of sheet writes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Wait after every successful cell write
    pub write_delay_ms: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    pub console_output: bool,

    pub file_output: bool,

    /// Defaults to `logs/` next to the executable
    pub log_dir: Option<PathBuf>,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            worksheet: defaults::WORKSHEET.to_string(),
            service_account_path: PathBuf::from(defaults::SERVICE_ACCOUNT_FILE),
            access_token: String::new(),
            api_base_url: google_sheets::API_BASE_URL.to_string(),
            request_timeout_seconds: defaults::SHEETS_TIMEOUT_SECONDS,
            retry: RetryPolicy::default(),
        }
    }
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            identifier: defaults::IDENTIFIER_COLUMN.to_string(),
            name: defaults::NAME_COLUMN.to_string(),
            target: defaults::TARGET_COLUMN.to_string(),
            null_markers: defaults::NULL_MARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: endole::BASE_URL.to_string(),
            login_path: endole::LOGIN_PATH.to_string(),
            email: String::new(),
            password: String::new(),
            user_agent: defaults::USER_AGENT.to_string(),
            load_timeout_seconds: defaults::LOAD_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            retry: RetryPolicy::no_retry(),
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            write_delay_ms: defaults::WRITE_DELAY_MS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: true,
            log_dir: None,
            max_files: defaults::LOG_MAX_FILES,
            auto_cleanup_logs: true,
        }
    }
}

impl ColumnConfig {
    pub fn names(&self) -> ColumnNames {
        ColumnNames {
            identifier: self.identifier.clone(),
            name: self.name.clone(),
            target: self.target.clone(),
        }
    }
}

impl FetchConfig {
    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            user_agent: self.user_agent.clone(),
            timeout_seconds: self.load_timeout_seconds,
            max_requests_per_second: self.max_requests_per_second,
            follow_redirects: true,
            cookie_store: true,
        }
    }
}

impl SheetConfig {
    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            user_agent: defaults::USER_AGENT.to_string(),
            timeout_seconds: self.request_timeout_seconds,
            max_requests_per_second: 0,
            follow_redirects: true,
            cookie_store: false,
        }
    }
}

impl AppConfig {
    /// Structural checks that hold regardless of credentials.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.columns;
        for (label, value) in [
            ("columns.identifier", &c.identifier),
            ("columns.name", &c.name),
            ("columns.target", &c.target),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::validation(format!("{label} must not be empty")));
            }
        }
        if c.identifier == c.name || c.identifier == c.target || c.name == c.target {
            return Err(ConfigError::validation(
                "identifier, name and target columns must be distinct",
            ));
        }
        if self.fetch.load_timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "fetch.load_timeout_seconds must be greater than 0",
            ));
        }
        if self.fetch.max_requests_per_second == 0 {
            return Err(ConfigError::validation(
                "fetch.max_requests_per_second must be greater than 0",
            ));
        }
        if self.sheet.worksheet.trim().is_empty() {
            return Err(ConfigError::validation("sheet.worksheet must not be empty"));
        }
        Ok(())
    }

    /// Checks needed before talking to Endole and Google Sheets.
    pub fn validate_credentials(&self) -> Result<(), ConfigError> {
        for (label, value) in [
            ("sheet.spreadsheet_id (GOOGLE_SHEET_ID)", &self.sheet.spreadsheet_id),
            ("fetch.email (ENDOLE_EMAIL)", &self.fetch.email),
            ("fetch.password (ENDOLE_PASSWORD)", &self.fetch.password),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::validation(format!("{label} is not set")));
            }
        }
        if self.sheet.access_token.trim().is_empty()
            && !self.sheet.service_account_path.is_file()
        {
            return Err(ConfigError::validation(format!(
                "service account key {:?} not found and sheet.access_token (GOOGLE_ACCESS_TOKEN) is not set",
                self.sheet.service_account_path
            )));
        }
        Ok(())
    }
}

/// Configuration loader
pub struct ConfigManager {
    explicit_path: Option<PathBuf>,
}

impl ConfigManager {
    pub fn new(explicit_path: Option<PathBuf>) -> Self {
        Self { explicit_path }
    }

    /// Explicit path from the command line, falling back to `TURNOVER_SYNC_CONFIG`.
    pub fn from_args() -> Result<Self, ConfigError> {
        Self::from_arg_list(
            std::env::args().skip(1),
            std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from),
        )
    }

    /// At most one positional config path; options are not accepted.
    pub fn from_arg_list(
        mut args: impl Iterator<Item = String>,
        env_path: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let explicit_path = match args.next() {
            Some(arg) if arg.starts_with('-') => {
                return Err(ConfigError::UnknownArgument { argument: arg });
            }
            Some(arg) => Some(PathBuf::from(arg)),
            None => env_path,
        };
        if let Some(extra) = args.next() {
            return Err(ConfigError::UnknownArgument { argument: extra });
        }
        Ok(Self::new(explicit_path))
    }

    /// User-level config file stem, e.g. `~/.config/turnover-sync/config`.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join("config"))
    }

    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let defaults = config::Config::try_from(&AppConfig::default())?;

        let mut builder = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name("config/default").required(false));

        if let Some(user_path) = Self::user_config_path() {
            builder = builder.add_source(config::File::from(user_path).required(false));
        }
        builder = builder.add_source(config::File::with_name("config/local").required(false));

        if let Some(path) = &self.explicit_path {
            info!("Loading configuration from {:?}", path);
            builder = builder.add_source(config::File::from(path.as_path()));
        }

        builder = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("columns.null_markers"),
            )
            .set_override_option("fetch.email", env_non_empty("ENDOLE_EMAIL"))?
            .set_override_option("fetch.password", env_non_empty("ENDOLE_PASSWORD"))?
            .set_override_option("sheet.spreadsheet_id", env_non_empty("GOOGLE_SHEET_ID"))?
            .set_override_option("sheet.access_token", env_non_empty("GOOGLE_ACCESS_TOKEN"))?
            .set_override_option(
                "sheet.service_account_path",
                env_non_empty("GOOGLE_APPLICATION_CREDENTIALS"),
            )?;

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Prefix for `TURNOVER_SYNC__SECTION__KEY` variables
pub const ENV_PREFIX: &str = "TURNOVER_SYNC";

/// Variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "TURNOVER_SYNC_CONFIG";

const APP_DIR_NAME: &str = "turnover-sync";

/// Endole URLs
pub mod endole {
    pub const BASE_URL: &str = "https://app.endole.co.uk";

    pub const LOGIN_PATH: &str = "/login";
}

/// Google Sheets API endpoints
pub mod google_sheets {
    pub const API_BASE_URL: &str = "https://sheets.googleapis.com";
}

/// Default configuration values
pub mod defaults {
    pub const WORKSHEET: &str = "Parent";

    pub const SERVICE_ACCOUNT_FILE: &str = "service_account.json";

    pub const IDENTIFIER_COLUMN: &str = "Companies House Regestration Number";

    pub const NAME_COLUMN: &str = "Company";

    pub const TARGET_COLUMN: &str = "Individual Turnover";

    /// Stringified missing values left behind by spreadsheet exports
    pub const NULL_MARKERS: &[&str] = &["nan"];

    pub const USER_AGENT: &str = concat!("turnover-sync/", env!("CARGO_PKG_VERSION"));

    pub const LOAD_TIMEOUT_SECONDS: u64 = 30;

    pub const MAX_REQUESTS_PER_SECOND: u32 = 1;

    pub const SHEETS_TIMEOUT_SECONDS: u64 = 30;

    /// Sheets write quota is per minute; one write per second stays well under it
    pub const WRITE_DELAY_MS: u64 = 1000;

    pub const LOG_LEVEL: &str = "info";

    pub const LOG_MAX_FILES: u32 = 5;
}
