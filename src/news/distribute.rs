// src/news/distribute.rs
//! Percentage-based selection: each region gets `round(weight% * total)`
//! slots, split again across categories by their weights. Rounding is per
//! bucket and never corrected, so the result can be a little over or under
//! `total_count`.

use std::collections::HashMap;

use crate::buckets::{quota, BucketTables};
use crate::news::aggregate::AggregatedStore;
use crate::news::sort_by_recency;
use crate::news::types::Article;

pub fn distribute(
    store: &AggregatedStore,
    tables: &BucketTables,
    total_count: usize,
) -> Vec<Article> {
    let mut out = Vec::new();

    for region in &tables.regions {
        let region_quota = quota(region.weight, total_count);
        let articles = match store.get(&region.key) {
            Some(a) if !a.is_empty() => a,
            _ => continue,
        };
        if region_quota == 0 {
            continue;
        }

        let mut by_category: HashMap<&str, Vec<&Article>> = HashMap::new();
        for a in articles {
            by_category
                .entry(a.category_type.as_str())
                .or_default()
                .push(a);
        }

        for category in &tables.categories {
            let category_quota = quota(category.weight, region_quota);
            let Some(group) = by_category.get(category.key.as_str()) else {
                continue;
            };
            let mut group: Vec<Article> = group.iter().map(|a| (*a).clone()).collect();
            sort_by_recency(&mut group);
            out.extend(group.into_iter().take(category_quota));
        }
    }

    sort_by_recency(&mut out);
    out
}
