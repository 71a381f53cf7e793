// src/news/select.rs
use crate::news::aggregate::AggregatedStore;
use crate::news::sort_by_recency;
use crate::news::types::Article;

/// Union of the selected regions' articles whose category is selected,
/// newest first. Regions missing from the store are skipped; nothing is
/// deduplicated.
pub fn select<R, C>(store: &AggregatedStore, regions: &[R], categories: &[C]) -> Vec<Article>
where
    R: AsRef<str>,
    C: AsRef<str>,
{
    let mut out = Vec::new();
    for region in regions {
        let Some(articles) = store.get(region.as_ref()) else {
            continue;
        };
        out.extend(
            articles
                .iter()
                .filter(|a| categories.iter().any(|c| c.as_ref() == a.category_type))
                .cloned(),
        );
    }
    sort_by_recency(&mut out);
    out
}
