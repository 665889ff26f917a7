//! HTTP client with rate limiting and error classification
//!
//! Thin wrapper around `reqwest` shared by the Endole fetcher and the
//! Google Sheets store. Requests wait on an optional `governor` limiter and
//! non-success statuses are turned into typed errors.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{Client, RequestBuilder, Response};
use thiserror::Error;
use url::Url;

/// HTTP client configuration
#[derive(Debug, Clone, serde::Serialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// `0` disables rate limiting
    pub max_requests_per_second: u32,
    pub follow_redirects: bool,
    pub cookie_store: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("turnover-sync/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_seconds: 30,
            max_requests_per_second: 1,
            follow_redirects: true,
            cookie_store: true,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}: {body}")]
    Status { url: String, status: u16, body: String },
}

impl HttpError {
    pub fn timed_out(url: &Url) -> Self {
        Self::Timeout {
            url: url.to_string(),
        }
    }

    fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }

    /// Whether repeating the same request could succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

/// A loaded page: the final URL after redirects plus the body.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub body: String,
}

/// Longest error body kept in [`HttpError::Status`].
const MAX_ERROR_BODY: usize = 512;

pub struct HttpClient {
    client: Client,
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .cookie_store(config.cookie_store)
            .gzip(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        let rate_limiter = NonZeroU32::new(config.max_requests_per_second)
            .map(|rps| RateLimiter::direct(Quota::per_second(rps)));

        Ok(Self {
            client,
            rate_limiter,
        })
    }

    /// Start a request on the underlying client.
    pub fn request(&self, method: reqwest::Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Send a request, waiting for the rate limiter first.
    ///
    /// Non-success statuses become [`HttpError::Status`] with a truncated body.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, HttpError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let request = request.build().map_err(|e| HttpError::Transport {
            url: String::new(),
            message: e.to_string(),
        })?;
        let url = request.url().to_string();
        tracing::debug!("{} {}", request.method(), url);

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| HttpError::from_reqwest(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            body.truncate(floor_char_boundary(&body, MAX_ERROR_BODY));
            return Err(HttpError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// GET a page and return its final URL and body text.
    pub async fn get_page(&self, url: &Url) -> Result<Page, HttpError> {
        let response = self
            .send(self.request(reqwest::Method::GET, url.clone()))
            .await?;
        read_page(url, response).await
    }

    /// POST an urlencoded form and return the resulting page.
    pub async fn post_form(&self, url: &Url, form: &[(String, String)]) -> Result<Page, HttpError> {
        let response = self
            .send(self.request(reqwest::Method::POST, url.clone()).form(form))
            .await?;
        read_page(url, response).await
    }
}

async fn read_page(requested: &Url, response: Response) -> Result<Page, HttpError> {
    let final_url = response.url().clone();
    let body = response
        .text()
        .await
        .map_err(|e| HttpError::from_reqwest(requested.as_str(), e))?;
    Ok(Page {
        url: final_url,
        body,
    })
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}
