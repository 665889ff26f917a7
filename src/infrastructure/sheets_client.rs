//! Google Sheets data store
//!
//! Talks to the Sheets API v4 `values` endpoints. Every attempt asks
//! [`SheetsAuth`] for its bearer token, so service-account tokens are
//! refreshed across a long run. Calls go through the store's [`RetryPolicy`],
//! so quota (429) and server errors are retried before a `PersistError`
//! reaches the caller.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::domain::{CellPosition, DataStore, Grid, PersistError};
use crate::infrastructure::config::SheetConfig;
use crate::infrastructure::http_client::{HttpClient, HttpError};
use crate::infrastructure::retry_policy::RetryPolicy;
use crate::infrastructure::sheets_auth::SheetsAuth;

/// `valueInputOption` for header writes: stored exactly as given
const HEADER_INPUT_OPTION: &str = "RAW";

/// `valueInputOption` for cell writes: parsed as if typed into the UI
const CELL_INPUT_OPTION: &str = "USER_ENTERED";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: Vec<Vec<&'a str>>,
}

pub struct GoogleSheetsStore {
    http: HttpClient,
    api_base: Url,
    spreadsheet_id: String,
    worksheet: String,
    auth: SheetsAuth,
    retry: RetryPolicy,
}

impl GoogleSheetsStore {
    pub fn new(config: &SheetConfig) -> Result<Self> {
        let auth = SheetsAuth::from_config(config)?;
        Self::with_auth(config, auth)
    }

    pub fn with_auth(config: &SheetConfig, auth: SheetsAuth) -> Result<Self> {
        let http = HttpClient::new(config.http_client_config())?;
        let api_base = Url::parse(&config.api_base_url)
            .with_context(|| format!("Invalid Sheets API URL: {}", config.api_base_url))?;

        Ok(Self {
            http,
            api_base,
            spreadsheet_id: config.spreadsheet_id.clone(),
            worksheet: config.worksheet.clone(),
            auth,
            retry: config.retry.clone(),
        })
    }

    /// Quoted worksheet name, optionally followed by an A1 reference.
    pub fn range(&self, a1: Option<&str>) -> String {
        let sheet = format!("'{}'", self.worksheet.replace('\'', "''"));
        match a1 {
            Some(cell) => format!("{sheet}!{cell}"),
            None => sheet,
        }
    }

    fn values_url(&self, range: &str) -> Result<Url, PersistError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| PersistError::InvalidResponse {
                message: format!("API base URL cannot hold a path: {}", self.api_base),
            })?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }

    async fn send_with_retry(
        &self,
        method: Method,
        url: Url,
        range: &str,
        body: Option<&ValueRangeBody<'_>>,
    ) -> Result<reqwest::Response, PersistError> {
        let http = &self.http;
        let auth = &self.auth;

        self.retry
            .run(
                "Sheets request",
                || {
                    let mut request = http.request(method.clone(), url.clone());
                    if let Some(body) = body {
                        request = request.json(body);
                    }
                    async move {
                        let token = auth.bearer_token().await?;
                        http.send(request.bearer_auth(token))
                            .await
                            .map_err(|e| persist_error(range, e))
                    }
                },
                PersistError::is_recoverable,
            )
            .await
    }

    async fn put_values(
        &self,
        range: &str,
        values: Vec<&str>,
        input_option: &str,
    ) -> Result<(), PersistError> {
        let mut url = self.values_url(range)?;
        url.query_pairs_mut().append_pair("valueInputOption", input_option);

        let body = ValueRangeBody {
            range,
            major_dimension: "ROWS",
            values: vec![values],
        };
        self.send_with_retry(Method::PUT, url, range, Some(&body)).await?;
        debug!("Wrote {}", range);
        Ok(())
    }
}

#[async_trait]
impl DataStore for GoogleSheetsStore {
    async fn read_all(&self) -> Result<Grid, PersistError> {
        let range = self.range(None);
        let mut url = self.values_url(&range)?;
        url.query_pairs_mut().append_pair("majorDimension", "ROWS");

        let response = self.send_with_retry(Method::GET, url, &range, None).await?;
        let value_range: ValueRange =
            response.json().await.map_err(|e| PersistError::InvalidResponse {
                message: e.to_string(),
            })?;

        Ok(grid_from_values(value_range.values))
    }

    async fn write_header(&self, header: &[String]) -> Result<(), PersistError> {
        let range = self.range(Some("A1"));
        let values = header.iter().map(String::as_str).collect();
        self.put_values(&range, values, HEADER_INPUT_OPTION).await
    }

    async fn write_cell(&self, position: CellPosition, value: &str) -> Result<(), PersistError> {
        let range = self.range(Some(&position.a1()));
        self.put_values(&range, vec![value], CELL_INPUT_OPTION).await
    }
}

fn persist_error(range: &str, e: HttpError) -> PersistError {
    match e {
        HttpError::Status { status, body, .. } => PersistError::Http {
            status,
            range: range.to_string(),
            message: body,
        },
        other => PersistError::Transport {
            range: range.to_string(),
            message: other.to_string(),
        },
    }
}

/// Turn a ragged `values` array into a rectangular grid.
///
/// The API drops trailing empty cells, so every row (header included) is
/// padded to the widest row. Non-string cells are stringified.
fn grid_from_values(values: Vec<Vec<Value>>) -> Grid {
    let width = values.iter().map(Vec::len).max().unwrap_or(0);
    let mut rows = values.into_iter().map(|row| {
        let mut cells: Vec<String> = row.into_iter().map(cell_to_string).collect();
        cells.resize(width, String::new());
        cells
    });

    let header = rows.next().unwrap_or_default();
    Grid {
        header,
        rows: rows.collect(),
    }
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::test_server::{Reply, TestServer};
    use serde_json::json;

    fn store(worksheet: &str) -> GoogleSheetsStore {
        GoogleSheetsStore::new(&SheetConfig {
            spreadsheet_id: "sheet-123".into(),
            worksheet: worksheet.into(),
            access_token: "token".into(),
            ..SheetConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_range_quotes_worksheet() {
        assert_eq!(store("Parent").range(None), "'Parent'");
        assert_eq!(store("Parent").range(Some("C5")), "'Parent'!C5");
        assert_eq!(store("Bob's List").range(Some("A1")), "'Bob''s List'!A1");
    }

    #[test]
    fn test_values_url() {
        let s = store("Parent");
        let url = s.values_url(&s.range(Some("C5"))).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/'Parent'!C5"
        );
    }

    #[test]
    fn test_values_url_encodes_spaces() {
        let s = store("My Sheet");
        let url = s.values_url(&s.range(None)).unwrap();
        assert!(url.as_str().ends_with("/values/'My%20Sheet'"));
    }

    #[test]
    fn test_grid_pads_ragged_rows() {
        let values: Vec<Vec<Value>> = serde_json::from_value(json!([
            ["Company", "Companies House Regestration Number"],
            ["Acme & Co", "12345678", "£1m"],
            ["Solo"],
            [],
        ]))
        .unwrap();

        let grid = grid_from_values(values);
        assert_eq!(grid.header, vec!["Company", "Companies House Regestration Number", ""]);
        assert_eq!(grid.rows.len(), 3);
        assert_eq!(grid.rows[1], vec!["Solo", "", ""]);
        assert_eq!(grid.rows[2], vec!["", "", ""]);
    }

    #[test]
    fn test_grid_stringifies_numbers() {
        let values: Vec<Vec<Value>> =
            serde_json::from_value(json!([["Company", "No"], ["Acme", 12345678]])).unwrap();
        let grid = grid_from_values(values);
        assert_eq!(grid.rows[0][1], "12345678");
    }

    #[test]
    fn test_empty_sheet_gives_empty_header() {
        let grid = grid_from_values(Vec::new());
        assert!(grid.header.is_empty());
        assert!(grid.rows.is_empty());
    }

    #[test]
    fn test_value_range_without_values() {
        let parsed: ValueRange =
            serde_json::from_value(json!({"range": "'Parent'!A1:Z1000", "majorDimension": "ROWS"}))
                .unwrap();
        assert!(parsed.values.is_empty());
    }

    #[test]
    fn test_status_maps_to_http_persist_error() {
        let err = persist_error(
            "'Parent'!C5",
            HttpError::Status {
                url: "u".into(),
                status: 429,
                body: "quota".into(),
            },
        );
        assert!(err.is_recoverable());
        assert!(matches!(err, PersistError::Http { status: 429, .. }));
    }

    fn local_store(server: &TestServer) -> GoogleSheetsStore {
        GoogleSheetsStore::new(&SheetConfig {
            spreadsheet_id: "sheet-123".into(),
            access_token: "ya29.test".into(),
            api_base_url: server.url(),
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay_ms: 10,
                max_delay_ms: 10,
                backoff_multiplier: 1.0,
                jitter: false,
            },
            ..SheetConfig::default()
        })
        .unwrap()
    }

    fn route_path(store: &GoogleSheetsStore, a1: Option<&str>) -> String {
        let url = store.values_url(&store.range(a1)).unwrap();
        url.path().to_string()
    }

    #[tokio::test]
    async fn test_write_cell_retries_quota_errors() {
        let server = TestServer::start().await;
        let store = local_store(&server);
        server.route(
            &route_path(&store, Some("C5")),
            [Reply::status(429, "quota exceeded"), Reply::ok("{}")],
        );

        store
            .write_cell(CellPosition::new(5, 3), "£1.2m")
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        for request in &requests {
            assert_eq!(request.method, "PUT");
            assert_eq!(request.header("authorization"), Some("Bearer ya29.test"));
            assert!(request.target.ends_with("valueInputOption=USER_ENTERED"));
            assert!(request.body.contains("£1.2m"));
        }
    }

    #[tokio::test]
    async fn test_write_cell_does_not_retry_permission_errors() {
        let server = TestServer::start().await;
        let store = local_store(&server);
        server.route(
            &route_path(&store, Some("C5")),
            [Reply::status(403, "protected range")],
        );

        let err = store
            .write_cell(CellPosition::new(5, 3), "£1.2m")
            .await
            .unwrap_err();

        assert!(matches!(err, PersistError::Http { status: 403, .. }));
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_write_header_is_raw() {
        let server = TestServer::start().await;
        let store = local_store(&server);
        server.route(&route_path(&store, Some("A1")), [Reply::ok("{}")]);

        let header = vec!["Company".to_string(), "Individual Turnover".to_string()];
        store.write_header(&header).await.unwrap();

        let requests = server.requests();
        let request = &requests[0];
        assert!(request.target.ends_with("valueInputOption=RAW"));
        let body: Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body["values"], json!([["Company", "Individual Turnover"]]));
    }

    #[tokio::test]
    async fn test_read_all_pads_rows() {
        let server = TestServer::start().await;
        let store = local_store(&server);
        let body = json!({
            "range": "'Parent'!A1:Z1000",
            "majorDimension": "ROWS",
            "values": [["Company", "No"], ["Acme & Co", "12345678", "£1.2m"]],
        });
        server.route(&route_path(&store, None), [Reply::ok(body.to_string())]);

        let grid = store.read_all().await.unwrap();

        assert_eq!(grid.header, vec!["Company", "No", ""]);
        assert_eq!(grid.rows, vec![vec!["Acme & Co", "12345678", "£1.2m"]]);
    }
}
