// src/news/types.rs
use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Query sent to the news endpoint for one (region, category) slice.
/// Empty or missing values are never put on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsQuery {
    pub country: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub q: Option<String>,
    pub timeframe: Option<String>,
}

impl NewsQuery {
    /// Non-empty parameters in upstream order (`apikey` is added by the client).
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        [
            ("country", &self.country),
            ("category", &self.category),
            ("language", &self.language),
            ("q", &self.q),
            ("timeframe", &self.timeframe),
        ]
        .into_iter()
        .filter_map(|(k, v)| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| (k, s.to_string()))
        })
        .collect()
    }
}

/// Upstream response envelope: `{status, totalResults, results, nextPage}`.
/// `results` stays untyped so one malformed item cannot sink the whole slice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsResponse {
    #[serde(default)]
    pub status: String,
    #[serde(rename = "totalResults", default)]
    pub total_results: u64,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
    #[serde(rename = "nextPage", default)]
    pub next_page: Option<String>,
}

impl NewsResponse {
    /// Parse `results` into articles. Returns (articles, dropped_count).
    pub fn articles(&self) -> (Vec<RawArticle>, usize) {
        let mut out = Vec::with_capacity(self.results.len());
        let mut dropped = 0usize;
        for v in &self.results {
            match RawArticle::from_value(v) {
                Some(a) => out.push(a),
                None => dropped += 1,
            }
        }
        (out, dropped)
    }
}

fn null_as_default<'de, D, T>(d: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// An article as the upstream returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    pub article_id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub link: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(rename = "pubDate", default, deserialize_with = "null_as_default")]
    pub pub_date: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub language: String,
}

impl RawArticle {
    /// Lenient per-item parse; items without an id or title are rejected.
    pub fn from_value(v: &serde_json::Value) -> Option<Self> {
        let a: RawArticle = serde_json::from_value(v.clone()).ok()?;
        if a.article_id.trim().is_empty() || a.title.trim().is_empty() {
            return None;
        }
        Some(a)
    }
}

/// A tagged article: upstream fields plus the slice it was fetched for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    #[serde(flatten)]
    pub raw: RawArticle,
    pub region: String,
    #[serde(rename = "categoryType")]
    pub category_type: String,
    #[serde(skip)]
    pub published_at: Option<DateTime<Utc>>,
}

impl Article {
    pub fn tag(raw: RawArticle, region: &str, category_type: &str) -> Self {
        let published_at = parse_pub_date(&raw.pub_date);
        Self {
            raw,
            region: region.to_string(),
            category_type: category_type.to_string(),
            published_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.raw.article_id
    }
}

/// Parse upstream `pubDate`. NewsData sends `YYYY-MM-DD HH:MM:SS` in UTC;
/// RFC 3339 and bare dates are accepted as well.
pub fn parse_pub_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

/// Anything that can answer a [`NewsQuery`] with an upstream-shaped response.
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch(&self, query: &NewsQuery) -> Result<NewsResponse>;
    fn name(&self) -> &'static str;
}
