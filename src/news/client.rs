// src/news/client.rs
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::Client;

use crate::config::UpstreamConfig;
use crate::news::types::{NewsQuery, NewsResponse, NewsSource};

pub const DEFAULT_BASE_URL: &str = "https://newsdata.io/api/1/news";

/// HTTP client for the NewsData.io `/news` endpoint (or a proxy exposing the
/// same query parameters). One GET per call, no retries.
#[derive(Clone)]
pub struct NewsDataClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl NewsDataClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs.max(1));
        self
    }

    pub fn from_config(cfg: &UpstreamConfig) -> Self {
        Self::new(cfg.base_url.clone(), cfg.resolved_api_key())
            .with_timeout(cfg.request_timeout_secs)
    }

    /// Wire parameters for `query`, with `apikey` appended when configured.
    pub fn params(&self, query: &NewsQuery) -> Vec<(&'static str, String)> {
        let mut params = query.to_params();
        if let Some(key) = &self.api_key {
            params.push(("apikey", key.clone()));
        }
        params
    }
}

#[async_trait]
impl NewsSource for NewsDataClient {
    async fn fetch(&self, query: &NewsQuery) -> Result<NewsResponse> {
        let t0 = std::time::Instant::now();
        counter!("news_fetch_total").increment(1);

        let rsp = self
            .client
            .get(&self.base_url)
            .query(&self.params(query))
            .timeout(self.timeout)
            .send()
            .await
            .context("news request failed")?;

        let status = rsp.status();
        if !status.is_success() {
            bail!("news endpoint returned HTTP {status}");
        }

        let body: NewsResponse = rsp.json().await.context("decoding news response")?;
        if body.status.eq_ignore_ascii_case("error") {
            bail!("news endpoint reported status=error");
        }

        histogram!("news_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(body)
    }

    fn name(&self) -> &'static str {
        "newsdata"
    }
}

/// Replays one stored response for every query. Used for offline runs.
pub struct FixtureSource {
    response: NewsResponse,
}

impl FixtureSource {
    pub fn from_json(content: &str) -> Result<Self> {
        let response = serde_json::from_str(content).context("parsing news fixture json")?;
        Ok(Self { response })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading news fixture from {}", path.display()))?;
        Self::from_json(&content)
    }
}

#[async_trait]
impl NewsSource for FixtureSource {
    async fn fetch(&self, _query: &NewsQuery) -> Result<NewsResponse> {
        counter!("news_fetch_total").increment(1);
        Ok(self.response.clone())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

/// Pick the source described by the upstream config.
pub fn source_from_config(cfg: &UpstreamConfig) -> Result<Arc<dyn NewsSource>> {
    let fixture = cfg.fixture_path.trim();
    if !fixture.is_empty() {
        tracing::info!(path = fixture, "using news fixture instead of HTTP");
        return Ok(Arc::new(FixtureSource::from_path(Path::new(fixture))?));
    }
    if cfg.resolved_api_key().is_none() {
        tracing::warn!(
            base_url = %cfg.base_url,
            "no API key configured; requests rely on a proxy injecting it"
        );
    }
    Ok(Arc::new(NewsDataClient::from_config(cfg)))
}
