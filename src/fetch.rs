//! HTTP fetching shared by all resolver strategies and the extractor.
//!
//! One `reqwest::Client` is built with a static browser identity header set
//! (plain library user agents get 403s from the lyrics site) and reused for
//! every call. Timeouts are applied per call; retry policy belongs to callers.

use anyhow::Context;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Per-call transport failure. Always caught by callers and converted into a
/// strategy-local miss or a user-facing message, never propagated raw.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("http status {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    http: reqwest::Client,
    page_timeout: Duration,
    probe_timeout: Duration,
}

impl Fetcher {
    pub fn new(page_timeout: Duration, probe_timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            http,
            page_timeout,
            probe_timeout,
        })
    }

    /// GET a content page and return the raw body on any 2xx response.
    pub async fn text(&self, url: &str) -> Result<String, FetchError> {
        let resp = self.http.get(url).timeout(self.page_timeout).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(resp.text().await?)
    }

    /// GET a JSON endpoint and return the parsed value on any 2xx response.
    pub async fn json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        let resp = self.http.get(url).timeout(self.page_timeout).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(resp.json().await?)
    }

    /// Short-timeout existence check: succeeds only on a success status.
    pub async fn probe(&self, url: &str) -> Result<(), FetchError> {
        let resp = self.http.get(url).timeout(self.probe_timeout).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_identity_headers() {
        assert!(Fetcher::new(Duration::from_secs(10), Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn error_display_is_specific() {
        assert_eq!(FetchError::Timeout.to_string(), "request timed out");
        assert_eq!(FetchError::Status(404).to_string(), "http status 404");
    }

    #[tokio::test]
    async fn status_split_on_text_and_probe() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for status in ["200 OK", "404 Not Found"] {
                let (mut sock, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 2048];
                let _ = sock.read(&mut buf).await;
                let body = "hello";
                let resp = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = sock.write_all(resp.as_bytes()).await;
            }
        });

        let fetcher = Fetcher::new(Duration::from_secs(2), Duration::from_secs(2)).unwrap();
        let url = format!("http://{addr}/page");

        // First response is a 2xx: body comes through.
        assert_eq!(fetcher.text(&url).await.unwrap(), "hello");

        // Second is a 404: surfaced as a status error, not a body.
        match fetcher.probe(&url).await {
            Err(FetchError::Status(404)) => {}
            other => panic!("expected status 404 error, got {other:?}"),
        }
    }
}
