// src/news/aggregate.rs
//! Fan-out over regions × categories, tagging every article with the slice it
//! came from. Failed slices count as empty; only a total outage is an error.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use futures::stream::{self, StreamExt};
use metrics::{counter, gauge};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::buckets::{BucketTables, CategoryBucket, RegionBucket};
use crate::config::UpstreamConfig;
use crate::news::ensure_metrics_described;
use crate::news::types::{Article, NewsQuery, NewsSource};

/// Region-keyed collection of tagged articles. Every configured region has a
/// key, possibly with an empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedStore {
    regions: HashMap<String, Vec<Article>>,
}

impl AggregatedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_region(&mut self, region: &str) {
        self.regions.entry(region.to_string()).or_default();
    }

    pub fn extend(&mut self, region: &str, articles: impl IntoIterator<Item = Article>) {
        self.regions
            .entry(region.to_string())
            .or_default()
            .extend(articles);
    }

    pub fn get(&self, region: &str) -> Option<&[Article]> {
        self.regions.get(region).map(Vec::as_slice)
    }

    pub fn contains_region(&self, region: &str) -> bool {
        self.regions.contains_key(region)
    }

    /// Total articles across all regions.
    pub fn len(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub struct AggregateOptions {
    pub language: String,
    pub max_days_old: u32,
    pub concurrency: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            language: "es".to_string(),
            max_days_old: 7,
            concurrency: 4,
        }
    }
}

impl From<&UpstreamConfig> for AggregateOptions {
    fn from(cfg: &UpstreamConfig) -> Self {
        Self {
            language: cfg.language.clone(),
            max_days_old: cfg.max_days_old,
            concurrency: cfg.concurrency,
        }
    }
}

impl AggregateOptions {
    /// Recency window in hours, as the upstream `timeframe` expects.
    pub fn timeframe(&self) -> String {
        (u64::from(self.max_days_old) * 24).to_string()
    }
}

/// Query for one (region, category) slice.
pub fn build_query(
    region: &RegionBucket,
    category: &CategoryBucket,
    opts: &AggregateOptions,
) -> NewsQuery {
    let non_empty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };
    NewsQuery {
        country: non_empty(&region.code),
        category: non_empty(&category.code),
        language: non_empty(&opts.language),
        q: region.search_term.as_deref().and_then(non_empty),
        timeframe: Some(opts.timeframe()),
    }
}

struct SliceOutcome {
    order: usize,
    region: String,
    articles: Option<Vec<Article>>,
}

/// Fetch and tag one (region, category) slice.
async fn fetch_slice(
    source: &dyn NewsSource,
    opts: &AggregateOptions,
    order: usize,
    region: &RegionBucket,
    category: &CategoryBucket,
) -> SliceOutcome {
    let query = build_query(region, category, opts);
    let articles = match source.fetch(&query).await {
        Ok(resp) => {
            let (raw, dropped) = resp.articles();
            if dropped > 0 {
                debug!(
                    region = %region.key,
                    category = %category.key,
                    dropped,
                    "dropped malformed upstream items"
                );
                counter!("news_articles_dropped_total").increment(dropped as u64);
            }
            let tagged: Vec<Article> = raw
                .into_iter()
                .map(|a| Article::tag(a, &region.key, &category.key))
                .collect();
            counter!("news_articles_tagged_total").increment(tagged.len() as u64);
            Some(tagged)
        }
        Err(e) => {
            warn!(
                error = ?e,
                source = source.name(),
                region = %region.key,
                category = %category.key,
                "news fetch failed; slice treated as empty"
            );
            counter!("news_fetch_errors_total").increment(1);
            None
        }
    };
    SliceOutcome {
        order,
        region: region.key.clone(),
        articles,
    }
}

/// Fetch every (region, category) pair and build the store.
///
/// Fetches run concurrently (bounded by `opts.concurrency`); results are merged
/// in table order once all of them have finished.
pub async fn aggregate(
    source: &dyn NewsSource,
    tables: &BucketTables,
    opts: &AggregateOptions,
) -> Result<AggregatedStore> {
    ensure_metrics_described();

    let pairs: Vec<(&RegionBucket, &CategoryBucket)> = tables
        .regions
        .iter()
        .flat_map(|r| tables.categories.iter().map(move |c| (r, c)))
        .collect();

    let mut outcomes: Vec<SliceOutcome> = stream::iter(0..pairs.len())
        .map(|order| {
            let (region, category) = pairs[order];
            fetch_slice(source, opts, order, region, category)
        })
        .buffer_unordered(opts.concurrency.max(1))
        .collect()
        .await;

    outcomes.sort_by_key(|o| o.order);

    let mut store = AggregatedStore::new();
    for r in &tables.regions {
        store.ensure_region(&r.key);
    }

    let mut failed = 0usize;
    for o in outcomes {
        match o.articles {
            Some(articles) => store.extend(&o.region, articles),
            None => failed += 1,
        }
    }

    if !pairs.is_empty() && failed == pairs.len() {
        bail!("all {} news fetches failed", pairs.len());
    }

    gauge!("news_last_load_ts").set(chrono::Utc::now().timestamp() as f64);
    info!(
        slices = pairs.len(),
        failed,
        articles = store.len(),
        "news load finished"
    );
    Ok(store)
}

/// A source bound to its tables and options; one `run` = one full reload.
#[derive(Clone)]
pub struct Aggregator {
    source: Arc<dyn NewsSource>,
    tables: Arc<BucketTables>,
    options: AggregateOptions,
}

impl Aggregator {
    pub fn new(
        source: Arc<dyn NewsSource>,
        tables: Arc<BucketTables>,
        options: AggregateOptions,
    ) -> Self {
        Self {
            source,
            tables,
            options,
        }
    }

    pub fn tables(&self) -> &Arc<BucketTables> {
        &self.tables
    }

    pub async fn run(&self) -> Result<AggregatedStore> {
        aggregate(self.source.as_ref(), &self.tables, &self.options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buckets::BucketTables;

    #[test]
    fn query_maps_codes_and_omits_empty_scopes() {
        let t = BucketTables::default();
        let opts = AggregateOptions::default();

        let q = build_query(t.region("global").unwrap(), t.category("other").unwrap(), &opts);
        assert_eq!(q.country, None);
        assert_eq!(q.category, None);
        assert_eq!(q.language.as_deref(), Some("es"));
        assert_eq!(q.timeframe.as_deref(), Some("168"));
        assert_eq!(q.q, None);

        let q = build_query(t.region("sevilla").unwrap(), t.category("economy").unwrap(), &opts);
        assert_eq!(q.country.as_deref(), Some("es"));
        assert_eq!(q.category.as_deref(), Some("business"));
        assert_eq!(q.q.as_deref(), Some("Sevilla"));
    }

    #[test]
    fn timeframe_is_hours() {
        let opts = AggregateOptions {
            max_days_old: 2,
            ..Default::default()
        };
        assert_eq!(opts.timeframe(), "48");
    }
}
