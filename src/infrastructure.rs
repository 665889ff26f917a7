//! Infrastructure layer: HTTP plumbing, the Endole fetcher, the Google
//! Sheets store and its credentials, configuration and logging.

pub mod config;
pub mod endole_client;
pub mod html_parser;
pub mod http_client;
pub mod logging;
pub mod retry_policy;
pub mod sheets_auth;
pub mod sheets_client;

#[cfg(test)]
mod test_server;

// Re-export commonly used items
pub use config::{AppConfig, ConfigError, ConfigManager};
pub use endole_client::EndoleClient;
pub use html_parser::TurnoverExtractor;
pub use http_client::{HttpClient, HttpClientConfig, HttpError};
pub use logging::{get_log_directory, init_logging_with_config, log_system_info};
pub use retry_policy::RetryPolicy;
pub use sheets_auth::SheetsAuth;
pub use sheets_client::GoogleSheetsStore;
