//! CiNii Research HTTP client.
//!
//! Sequential, rate-limited access to the OpenSearch endpoint and the
//! JSON-LD record endpoint. There are no retries: a failed request is
//! reported to the caller and the batch stops there.

use crate::error::{CiniiError, Result};
use crate::opensearch::{OpenSearchQuery, OpenSearchResponse, SearchType};
use serde_json::Value;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// CiNii Research base URL
pub const CINII_BASE_URL: &str = "https://cir.nii.ac.jp";

/// Default minimum interval between requests
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(1500);

/// Seconds reported with `RateLimited` when the server sends no `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// CiNii Research API client with rate limiting
pub struct CiniiClient {
    client: reqwest::Client,
    base_url: Url,
    appid: Option<String>,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl CiniiClient {
    /// Create a client against the public CiNii Research host
    pub fn new(appid: Option<String>) -> Result<Self> {
        Self::with_base_url(CINII_BASE_URL, appid)
    }

    /// Create a client against another host (a mirror or a mock server)
    pub fn with_base_url(base_url: &str, appid: Option<String>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CiniiError::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("rustcinii/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CiniiError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            appid,
            min_interval: DEFAULT_REQUEST_INTERVAL,
            last_request: Mutex::new(None),
        })
    }

    /// Override the minimum interval between requests
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Run one OpenSearch query.
    ///
    /// The client's app id is used unless the query carries its own.
    pub async fn opensearch(
        &self,
        search_type: SearchType,
        query: &OpenSearchQuery,
    ) -> Result<OpenSearchResponse> {
        query.validate()?;

        let mut query = query.clone();
        if query.appid.is_none() {
            query.appid = self.appid.clone();
        }

        let url = self.join(&format!("opensearch/{}", search_type))?;
        debug!(url = %url, start = ?query.start, count = ?query.count.map(|c| c.get()), "OpenSearch request");

        let body = self.get_text(url, &query.to_pairs()).await?;
        let response: OpenSearchResponse = serde_json::from_str(&body)
            .map_err(|e| CiniiError::Parse(format!("OpenSearch response: {}", e)))?;

        info!(
            total = response.total_results,
            start = response.start_index,
            items = response.items.len(),
            "OpenSearch page received"
        );
        Ok(response)
    }

    /// Fetch a JSON-LD record.
    ///
    /// `id` is a full record URI (`https://cir.nii.ac.jp/crid/...`) or a
    /// bare CRID. A trailing `.json` is tolerated.
    pub async fn record(&self, id: &str) -> Result<Value> {
        let url = self.record_url(id)?;
        debug!(url = %url, "Record request");

        let body = self.get_text(url, &[]).await?;
        serde_json::from_str(&body)
            .map_err(|e| CiniiError::Parse(format!("Record {}: {}", id, e)))
    }

    /// JSON-LD URL for a record id
    pub fn record_url(&self, id: &str) -> Result<Url> {
        let id = id.trim();
        let id = id.strip_suffix(".json").unwrap_or(id);
        if id.is_empty() {
            return Err(CiniiError::Config("Empty record id".to_string()));
        }

        if id.starts_with("http://") || id.starts_with("https://") {
            return Url::parse(&format!("{}.json", id))
                .map_err(|e| CiniiError::Config(format!("Invalid record id '{}': {}", id, e)));
        }

        self.join(&format!("crid/{}.json", id))
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| CiniiError::Config(format!("Invalid path '{}': {}", path, e)))
    }

    /// Wait until the minimum interval has passed since the last request
    async fn wait_for_rate_limit(&self) {
        let remaining = {
            let last = self.last_request.lock().ok();
            last.and_then(|l| *l)
                .map(|t| self.min_interval.saturating_sub(t.elapsed()))
        };

        if let Some(wait) = remaining.filter(|d| !d.is_zero()) {
            debug!(wait_ms = wait.as_millis() as u64, "Waiting for rate limit");
            tokio::time::sleep(wait).await;
        }

        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(Instant::now());
        }
    }

    async fn get_text(&self, url: Url, query: &[(&'static str, String)]) -> Result<String> {
        self.wait_for_rate_limit().await;

        let response = self.client.get(url.clone()).query(query).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.text().await?);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            warn!(url = %url, retry_after, "Rate limited by CiNii");
            return Err(CiniiError::RateLimited(retry_after));
        }

        let message = response.text().await.unwrap_or_default();
        warn!(url = %url, status = status.as_u16(), "CiNii API error");
        Err(CiniiError::Api {
            code: status.as_u16() as i32,
            message: if message.is_empty() {
                status.to_string()
            } else {
                message
            },
        })
    }
}
