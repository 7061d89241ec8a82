// SPDX-License-Identifier: PMPL-1.0-or-later
//! HTTP page fetching

use async_trait::async_trait;
use reqwest::{redirect, Client};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{Result, WcagbotError};

/// Maximum redirects followed per request
const MAX_REDIRECTS: usize = 10;

/// A fetched HTML document
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    /// URL as requested
    pub url: String,
    /// URL after redirects
    pub final_url: String,
    pub status: u16,
    /// Response headers, lowercase names
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub load_time_ms: u64,
    /// Final URL differs from the requested one
    pub redirected: bool,
}

impl FetchedPage {
    /// Page built from markup that did not come over the network
    pub fn from_markup(url: &str, body: &str) -> Self {
        Self {
            url: url.to_string(),
            final_url: url.to_string(),
            status: 200,
            body: body.to_string(),
            ..Self::default()
        }
    }
}

/// Source of page markup
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch an HTML page. Non-success statuses and non-HTML bodies are errors.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;

    /// Fetch any text resource (robots.txt, sitemaps)
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// reqwest-backed fetcher
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let started = Instant::now();
        let response = self.client.get(url).send().await.map_err(|e| WcagbotError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WcagbotError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        let final_url = response.url().to_string();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        if let Some(content_type) = headers.get("content-type") {
            let ct = content_type.to_ascii_lowercase();
            if !ct.contains("html") && !ct.contains("xml") {
                return Err(WcagbotError::Fetch {
                    url: url.to_string(),
                    reason: format!("not an HTML document ({})", content_type),
                });
            }
        }

        let body = response.text().await.map_err(|e| WcagbotError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let load_time_ms = started.elapsed().as_millis() as u64;
        let redirected = final_url.trim_end_matches('/') != url.trim_end_matches('/');

        debug!("Fetched {} ({} bytes, {}ms)", final_url, body.len(), load_time_ms);

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            status: status.as_u16(),
            headers,
            body,
            load_time_ms,
            redirected,
        })
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(WcagbotError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status().as_u16()),
            });
        }
        Ok(response.text().await?)
    }
}
