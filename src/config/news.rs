// src/config/news.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::buckets::{
    default_categories, default_regions, BucketTables, CategoryBucket, RegionBucket,
};
use crate::news::client::DEFAULT_BASE_URL;

pub const DEFAULT_NEWS_CONFIG_PATH: &str = "config/news.toml";
pub const ENV_NEWS_CONFIG_PATH: &str = "NEWS_CONFIG_PATH";
pub const ENV_NEWS_API_KEY: &str = "NEWSDATA_API_KEY";
pub const ENV_NEWS_TOTAL_COUNT: &str = "NEWS_TOTAL_COUNT";
pub const ENV_NEWS_LANGUAGE: &str = "NEWS_LANGUAGE";

const MAX_TOTAL_COUNT: usize = 500;

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_language() -> String {
    "es".to_string()
}
fn default_max_days_old() -> u32 {
    7
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_concurrency() -> usize {
    4
}
fn default_total_count() -> usize {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// "ENV" means: read from NEWSDATA_API_KEY. Empty: send no key (proxy mode).
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_max_days_old")]
    pub max_days_old: u32,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// When set, replay this JSON response instead of calling HTTP.
    #[serde(default)]
    pub fixture_path: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: default_api_key(),
            language: default_language(),
            max_days_old: default_max_days_old(),
            request_timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
            fixture_path: String::new(),
        }
    }
}

impl UpstreamConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        let raw = self.api_key.trim();
        let key = if raw.eq_ignore_ascii_case("env") {
            std::env::var(ENV_NEWS_API_KEY).ok()?
        } else {
            raw.to_string()
        };
        let key = key.trim().to_string();
        (!key.is_empty()).then_some(key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_total_count")]
    pub total_count: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            total_count: default_total_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default = "default_regions")]
    pub regions: Vec<RegionBucket>,
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryBucket>,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig::default(),
            display: DisplayConfig::default(),
            regions: default_regions(),
            categories: default_categories(),
        }
    }
}

impl NewsConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: NewsConfig = toml::from_str(s).context("parsing news config toml")?;
        cfg.sanitize();
        cfg.tables().validate()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading news config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $NEWS_CONFIG_PATH (must exist)
    /// 2) config/news.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_NEWS_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("NEWS_CONFIG_PATH points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_NEWS_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    /// Overrides from `NEWS_TOTAL_COUNT` and `NEWS_LANGUAGE`; unparsable values are ignored.
    pub fn apply_env_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(n) = get(ENV_NEWS_TOTAL_COUNT).and_then(|s| s.trim().parse::<usize>().ok()) {
            self.display.total_count = n.min(MAX_TOTAL_COUNT);
        }
        if let Some(lang) = get(ENV_NEWS_LANGUAGE) {
            let lang = lang.trim();
            if !lang.is_empty() {
                self.upstream.language = lang.to_string();
            }
        }
    }

    pub fn tables(&self) -> BucketTables {
        BucketTables::new(self.regions.clone(), self.categories.clone())
    }

    fn sanitize(&mut self) {
        self.display.total_count = self.display.total_count.min(MAX_TOTAL_COUNT);
        if self.upstream.concurrency == 0 {
            self.upstream.concurrency = default_concurrency();
        }
        if self.upstream.base_url.trim().is_empty() {
            self.upstream.base_url = default_base_url();
        }
        for r in &mut self.regions {
            r.key = r.key.trim().to_string();
        }
        for c in &mut self.categories {
            c.key = c.key.trim().to_string();
        }
    }
}
