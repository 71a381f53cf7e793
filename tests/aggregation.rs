// tests/aggregation.rs
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use news_briefing::buckets::BucketTables;
use news_briefing::news::{aggregate, AggregateOptions, NewsQuery, NewsResponse, NewsSource};
use news_briefing::DEFAULT_LOG_FILTER;
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Answers every query with one article; fails the calls listed in `fail_calls`.
struct MockSource {
    calls: AtomicUsize,
    fail_calls: Vec<usize>,
    seen: Mutex<Vec<NewsQuery>>,
}

impl MockSource {
    fn failing(fail_calls: Vec<usize>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_calls,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl NewsSource for MockSource {
    async fn fetch(&self, query: &NewsQuery) -> Result<NewsResponse> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(query.clone());
        if self.fail_calls.contains(&n) {
            return Err(anyhow!("simulated outage on call {n}"));
        }
        Ok(serde_json::from_value(json!({
            "status": "success",
            "totalResults": 2,
            "results": [
                {
                    "article_id": format!("call-{n}"),
                    "title": "ok",
                    "pubDate": "2024-01-01 00:00:00"
                },
                {"title": "missing id"}
            ],
            "nextPage": null
        }))?)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn sequential() -> AggregateOptions {
    AggregateOptions {
        concurrency: 1,
        ..Default::default()
    }
}

#[tokio::test]
async fn one_failing_slice_does_not_abort_the_rest() {
    let tables = BucketTables::default();
    // (romania, geopolitics) is region #3, category #2 → call 3 * 4 + 2
    let src = MockSource::failing(vec![14]);

    let store = aggregate(&src, &tables, &sequential())
        .await
        .expect("partial failure is not a load failure");

    assert_eq!(src.calls.load(Ordering::SeqCst), 20);
    assert_eq!(store.len(), 19);

    let romania = store.get("romania").expect("romania key present");
    let cats: Vec<&str> = romania.iter().map(|a| a.category_type.as_str()).collect();
    assert_eq!(cats, ["politics", "economy", "other"]);

    for r in ["sevilla", "spain", "portugal", "global"] {
        let v = store.get(r).expect("region key present");
        assert_eq!(v.len(), 4, "{r}");
        assert!(v.iter().all(|a| a.region == r));
    }
}

#[tokio::test]
async fn region_with_every_slice_failing_keeps_an_empty_entry() {
    let tables = BucketTables::default();
    // romania is region #3 → calls 12..16
    let src = MockSource::failing((12..16).collect());

    let store = aggregate(&src, &tables, &sequential()).await.unwrap();

    assert!(store.contains_region("romania"));
    assert_eq!(store.get("romania").map(<[_]>::len), Some(0));
    assert_eq!(store.len(), 16);
    assert!(!store.contains_region("andorra"));
}

#[tokio::test]
async fn every_slice_failing_is_a_load_error() {
    let tables = BucketTables::default();
    let src = MockSource::failing((0..20).collect());
    let res = aggregate(&src, &tables, &AggregateOptions::default()).await;
    assert!(res.is_err());
}

#[tokio::test]
async fn queries_follow_code_tables() {
    let tables = BucketTables::default();
    let src = MockSource::failing(vec![]);
    aggregate(&src, &tables, &sequential()).await.unwrap();

    let seen = src.seen.lock().unwrap();
    assert_eq!(seen.len(), 20);

    // sevilla × politics
    assert_eq!(seen[0].country.as_deref(), Some("es"));
    assert_eq!(seen[0].category.as_deref(), Some("politics"));
    assert_eq!(seen[0].q.as_deref(), Some("Sevilla"));
    assert_eq!(seen[0].timeframe.as_deref(), Some("168"));
    assert_eq!(seen[0].language.as_deref(), Some("es"));

    // spain × economy
    assert_eq!(seen[5].country.as_deref(), Some("es"));
    assert_eq!(seen[5].category.as_deref(), Some("business"));
    assert_eq!(seen[5].q, None);

    // global × other: no country, no category
    assert_eq!(seen[19].country, None);
    assert_eq!(seen[19].category, None);
}

#[tokio::test]
async fn concurrent_fetches_produce_the_same_store() {
    let tables = BucketTables::default();
    let a = aggregate(&MockSource::failing(vec![]), &tables, &sequential())
        .await
        .unwrap();
    let b = aggregate(
        &MockSource::failing(vec![]),
        &tables,
        &AggregateOptions {
            concurrency: 8,
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(a.len(), b.len());
    for r in tables.region_keys() {
        let ca: Vec<&str> = a.get(&r).unwrap().iter().map(|x| x.category_type.as_str()).collect();
        let cb: Vec<&str> = b.get(&r).unwrap().iter().map(|x| x.category_type.as_str()).collect();
        assert_eq!(ca, cb, "{r}");
    }
}

/// In-memory log sink for the fmt subscriber.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn load_summary_passes_the_default_log_filter() {
    let sink = Captured::default();
    let writer = sink.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(DEFAULT_LOG_FILTER))
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let tables = BucketTables::default();
    aggregate(&MockSource::failing(vec![3]), &tables, &sequential())
        .await
        .unwrap();

    let logs = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("news load finished"), "{logs}");
    assert!(logs.contains("failed=1"), "{logs}");
    // partial failures are warnings, so they pass the filter too
    assert!(logs.contains("slice treated as empty"), "{logs}");
}
