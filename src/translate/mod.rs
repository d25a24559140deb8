//! Line-level translation.
//!
//! The translation backend is an external capability behind a small trait so
//! the renderer can be exercised without network access. The shipped
//! implementation talks to a LibreTranslate-compatible endpoint.

use crate::config::TranslatorConfig;
use anyhow::Context;
use std::time::Duration;
use tracing::debug;

/// Best-effort single-line translation. Callers treat an error or an
/// identical/empty result as "leave the line untranslated".
pub trait Translate {
    async fn translate_line(&self, text: &str) -> anyhow::Result<String>;
}

/// LibreTranslate-backed translator. One fixed 2-second backoff retry on a
/// rate-limit response, nothing more.
#[derive(Debug, Clone)]
pub struct LibreTranslator {
    http: reqwest::Client,
    endpoint: String,
    source: String,
    target: String,
}

const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(2);

impl LibreTranslator {
    pub fn new(cfg: &TranslatorConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build translator client")?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
            source: cfg.source_lang.clone(),
            target: cfg.target_lang.clone(),
        })
    }

    async fn request(&self, text: &str) -> anyhow::Result<reqwest::Response> {
        let form = [
            ("q", text),
            ("source", self.source.as_str()),
            ("target", self.target.as_str()),
            ("format", "text"),
        ];
        self.http
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .context("send translate request")
    }
}

impl Translate for LibreTranslator {
    async fn translate_line(&self, text: &str) -> anyhow::Result<String> {
        let mut resp = self.request(text).await?;
        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            debug!("translator rate limited, retrying once after backoff");
            tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
            resp = self.request(text).await?;
        }

        let v: serde_json::Value = resp
            .error_for_status()
            .context("translate http status")?
            .json()
            .await
            .context("parse translate json")?;

        v.get("translatedText")
            .and_then(|t| t.as_str())
            .map(|s| s.to_string())
            .context("translatedText missing in response")
    }
}
