//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building an HTTP client with the configured user agent and timeout
//! - GET requests for pages and robots.txt
//! - Classifying transport failures as unreachable (non-fatal) or fatal

use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// A completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,

    /// Response headers, names lowercased
    pub headers: HashMap<String, String>,

    /// Response body decoded as text
    pub body: String,
}

impl FetchResponse {
    /// Creates a response; header names are lowercased
    pub fn new<I, K, V>(status: u16, headers: I, body: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            status,
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.as_ref().to_lowercase(), value.into()))
                .collect(),
            body: body.into(),
        }
    }

    /// Returns true for 2xx status codes
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns a header value by (case-insensitive) name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Content-Type header value, if present
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Returns true if the Content-Type mentions `text/html`
    pub fn is_html(&self) -> bool {
        self.content_type()
            .is_some_and(|value| value.to_ascii_lowercase().contains("text/html"))
    }
}

/// Errors raised by a [`Fetcher`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// DNS failure, refused or reset connection, or timeout
    #[error("{url} is unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    /// Any other transport failure
    #[error("transport failure for {url}: {reason}")]
    Transport { url: String, reason: String },
}

/// Something that can GET a URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs a GET request and returns the full response
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// Default [`Fetcher`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher that identifies itself with `user_agent`
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Value of the User-Agent header
    /// * `timeout` - Total request timeout
    ///
    /// # Example
    ///
    /// ```no_run
    /// use handmade_crawler::crawler::HttpFetcher;
    /// use std::time::Duration;
    ///
    /// let fetcher = HttpFetcher::new("Handmade_Web_Crawler", Duration::from_secs(30)).unwrap();
    /// ```
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent, timeout)?,
        })
    }
}

/// Builds an HTTP client with proper configuration
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, &e))?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, &e))?;

        Ok(FetchResponse::new(status, headers, body))
    }
}

/// Maps a reqwest error onto [`FetchError`]
///
/// | Condition | Result |
/// |-----------|--------|
/// | Connect failure (DNS, refused) | Unreachable |
/// | Timeout | Unreachable |
/// | Connection reset / aborted / broken pipe | Unreachable |
/// | Anything else | Transport |
fn classify_error(url: &str, error: &reqwest::Error) -> FetchError {
    let reason = error.to_string();

    if error.is_connect() || error.is_timeout() || is_connection_dropped(error) {
        FetchError::Unreachable {
            url: url.to_string(),
            reason,
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            reason,
        }
    }
}

/// Walks the source chain looking for a dropped connection
fn is_connection_dropped(error: &reqwest::Error) -> bool {
    let mut source = error.source();
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::TimedOut
            ) {
                return true;
            }
        }
        source = err.source();
    }
    false
}
