//! Endole fetch client
//!
//! Logs in once with the configured credentials, then loads
//! `/company/{number}/{slug}` per request and reads the turnover figure
//! from the page's financials frame.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};
use url::Url;

use crate::domain::{FetchClient, FetchError, FetchedValue};
use crate::infrastructure::config::FetchConfig;
use crate::infrastructure::html_parser::TurnoverExtractor;
use crate::infrastructure::http_client::{HttpClient, HttpError, Page};
use crate::infrastructure::retry_policy::RetryPolicy;

pub struct EndoleClient {
    http: HttpClient,
    extractor: TurnoverExtractor,
    base_url: Url,
    login_path: String,
    load_timeout: Duration,
    retry: RetryPolicy,
}

impl EndoleClient {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let http = HttpClient::new(config.http_client_config())?;
        let extractor = TurnoverExtractor::new()?;
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid Endole base URL: {}", config.base_url))?;

        Ok(Self {
            http,
            extractor,
            base_url,
            login_path: config.login_path.clone(),
            load_timeout: Duration::from_secs(config.load_timeout_seconds),
            retry: config.retry.clone(),
        })
    }

    /// Build the client and sign in.
    pub async fn connect(config: &FetchConfig) -> Result<Self> {
        let client = Self::new(config)?;
        client
            .login(&config.email, &config.password)
            .await
            .context("Endole login failed")?;
        Ok(client)
    }

    /// Submit the sign-in form; the session cookie is kept by the client.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), FetchError> {
        info!("🔐 Logging in to Endole...");
        let login_url = self
            .base_url
            .join(&self.login_path)
            .map_err(|e| FetchError::navigation(&self.login_path, e))?;

        let page = self.load_page(&login_url).await?;
        let form = self.extractor.login_form(&page.body, &page.url);

        let response = self
            .http
            .post_form(&form.action, &form.fields(email, password))
            .await
            .map_err(|e| self.to_fetch_error(&form.action, e))?;

        if response.url.path().starts_with(login_url.path()) {
            return Err(FetchError::Authentication {
                message: "still on the login page after submitting credentials".to_string(),
            });
        }

        info!("✅ Logged in successfully.");
        Ok(())
    }

    /// Deterministic company page address; segments are percent-encoded.
    pub fn company_url(&self, record_id: &str, slug: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                FetchError::navigation(self.base_url.as_str(), "base URL cannot hold a path")
            })?
            .pop_if_empty()
            .extend(["company", record_id, slug]);
        Ok(url)
    }

    /// GET a page within the load timeout, retrying transient failures per policy.
    async fn load_page(&self, url: &Url) -> Result<Page, FetchError> {
        let http = &self.http;
        let timeout = self.load_timeout;

        self.retry
            .run(
                "Endole page load",
                move || async move {
                    match tokio::time::timeout(timeout, http.get_page(url)).await {
                        Ok(result) => result,
                        Err(_) => Err(HttpError::timed_out(url)),
                    }
                },
                HttpError::is_recoverable,
            )
            .await
            .map_err(|e| self.to_fetch_error(url, e))
    }

    /// Financials tile of an already loaded company page.
    ///
    /// Any failure in here degrades to `NotFound`: the company page itself
    /// loaded, so the row gets the sentinel rather than an error.
    async fn read_financials(&self, page: &Page) -> FetchedValue {
        let Some(frame_url) = self.extractor.financials_frame_url(&page.body, &page.url) else {
            warn!("⚠️  No financials frame on {}", page.url);
            return FetchedValue::NotFound;
        };

        match self.load_page(&frame_url).await {
            Ok(frame) => self.extractor.extract_turnover(&frame.body),
            Err(e) => {
                warn!("⚠️  Error scraping financials: {}", e);
                FetchedValue::NotFound
            }
        }
    }

    fn to_fetch_error(&self, url: &Url, e: HttpError) -> FetchError {
        match e {
            HttpError::Timeout { .. } => FetchError::Timeout {
                url: url.to_string(),
                timeout_secs: self.load_timeout.as_secs(),
            },
            other => FetchError::navigation(url.as_str(), other),
        }
    }
}

#[async_trait]
impl FetchClient for EndoleClient {
    async fn fetch(&self, record_id: &str, slug: &str) -> Result<FetchedValue, FetchError> {
        let url = self.company_url(record_id, slug)?;
        info!("🔗 Visiting: {}", url);

        let page = self.load_page(&url).await?;
        Ok(self.read_financials(&page).await)
    }
}
