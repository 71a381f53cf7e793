// src/news/mod.rs
pub mod aggregate;
pub mod client;
pub mod distribute;
pub mod select;
pub mod types;

pub use aggregate::{aggregate, AggregateOptions, AggregatedStore, Aggregator};
pub use distribute::distribute;
pub use select::select;
pub use types::{Article, NewsQuery, NewsResponse, NewsSource, RawArticle};

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_fetch_total", "Upstream news requests issued.");
        describe_counter!(
            "news_fetch_errors_total",
            "Upstream requests that failed and were treated as empty slices."
        );
        describe_counter!(
            "news_articles_tagged_total",
            "Articles tagged with region and category."
        );
        describe_counter!(
            "news_articles_dropped_total",
            "Upstream items dropped because they could not be parsed."
        );
        describe_histogram!("news_fetch_ms", "Upstream request time in milliseconds.");
        describe_gauge!("news_last_load_ts", "Unix ts of the last successful load.");
    });
}

/// Newest first. Stable, so equal timestamps keep their input order;
/// articles without a parseable date sink to the end.
pub fn sort_by_recency(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn art(id: &str, date: &str) -> Article {
        let raw = RawArticle::from_value(&serde_json::json!({
            "article_id": id, "title": id, "pubDate": date
        }))
        .unwrap();
        Article::tag(raw, "spain", "economy")
    }

    #[test]
    fn recency_sort_puts_undated_last_and_is_stable() {
        let mut v = vec![
            art("old", "2024-01-01 00:00:00"),
            art("nodate", "??"),
            art("new", "2024-01-03 00:00:00"),
            art("tie-a", "2024-01-02 00:00:00"),
            art("tie-b", "2024-01-02 00:00:00"),
        ];
        sort_by_recency(&mut v);
        let ids: Vec<&str> = v.iter().map(Article::id).collect();
        assert_eq!(ids, ["new", "tie-a", "tie-b", "old", "nodate"]);
    }
}
