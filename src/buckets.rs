//! # Buckets
//!
//! Region and category tables: the named partitions the briefing is split
//! into, each with an upstream code and a display weight in percent.
//!
//! - Tables are ordered; iteration order is the order articles are fetched
//!   and the order filter chips are listed.
//! - Weights are percentages and are not required to sum to 100.
//! - An empty upstream code means "do not scope by this dimension"
//!   (global region, unscoped category).

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Badge fallback for articles whose region key is not in the table.
pub const FALLBACK_REGION_NAME: &str = "Global";
/// Badge fallback for articles whose category key is not in the table.
pub const FALLBACK_CATEGORY_NAME: &str = "Otras";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionBucket {
    pub key: String,
    /// Upstream `country` code; empty for global scope.
    #[serde(default)]
    pub code: String,
    pub weight: f64,
    #[serde(default)]
    pub name: String,
    /// Free-text `q` injected for regions finer than a country (e.g. a city).
    #[serde(default)]
    pub search_term: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBucket {
    pub key: String,
    /// Upstream `category` code; empty means unscoped.
    #[serde(default)]
    pub code: String,
    pub weight: f64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketTables {
    pub regions: Vec<RegionBucket>,
    pub categories: Vec<CategoryBucket>,
}

impl Default for BucketTables {
    fn default() -> Self {
        Self {
            regions: default_regions(),
            categories: default_categories(),
        }
    }
}

pub fn default_regions() -> Vec<RegionBucket> {
    [
        ("sevilla", "es", 10.0, "Sevilla", Some("Sevilla")),
        ("spain", "es", 40.0, "España", None),
        ("portugal", "pt", 10.0, "Portugal", None),
        ("romania", "ro", 10.0, "Rumanía", None),
        ("global", "", 30.0, "Global", None),
    ]
    .into_iter()
    .map(|(key, code, weight, name, q)| RegionBucket {
        key: key.to_string(),
        code: code.to_string(),
        weight,
        name: name.to_string(),
        search_term: q.map(str::to_string),
    })
    .collect()
}

pub fn default_categories() -> Vec<CategoryBucket> {
    [
        ("politics", "politics", 30.0, "Política"),
        ("economy", "business", 30.0, "Economía"),
        // closest upstream match for geopolitics
        ("geopolitics", "politics", 20.0, "Geopolítica"),
        ("other", "", 20.0, "Otras"),
    ]
    .into_iter()
    .map(|(key, code, weight, name)| CategoryBucket {
        key: key.to_string(),
        code: code.to_string(),
        weight,
        name: name.to_string(),
    })
    .collect()
}

impl BucketTables {
    pub fn new(regions: Vec<RegionBucket>, categories: Vec<CategoryBucket>) -> Self {
        Self {
            regions,
            categories,
        }
    }

    pub fn region(&self, key: &str) -> Option<&RegionBucket> {
        self.regions.iter().find(|r| r.key == key)
    }

    pub fn category(&self, key: &str) -> Option<&CategoryBucket> {
        self.categories.iter().find(|c| c.key == key)
    }

    pub fn region_keys(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.key.clone()).collect()
    }

    pub fn category_keys(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.key.clone()).collect()
    }

    pub fn region_name(&self, key: &str) -> &str {
        self.region(key)
            .map(|r| display_name(&r.name, &r.key))
            .unwrap_or(FALLBACK_REGION_NAME)
    }

    pub fn category_name(&self, key: &str) -> &str {
        self.category(key)
            .map(|c| display_name(&c.name, &c.key))
            .unwrap_or(FALLBACK_CATEGORY_NAME)
    }

    /// Keys must be non-empty and unique; weights finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        check_keys("region", self.regions.iter().map(|r| (r.key.as_str(), r.weight)))?;
        check_keys(
            "category",
            self.categories.iter().map(|c| (c.key.as_str(), c.weight)),
        )?;
        Ok(())
    }
}

fn display_name<'a>(name: &'a str, key: &'a str) -> &'a str {
    if name.trim().is_empty() {
        key
    } else {
        name
    }
}

fn check_keys<'a>(kind: &str, items: impl Iterator<Item = (&'a str, f64)>) -> Result<()> {
    let mut seen = HashSet::new();
    for (key, weight) in items {
        if key.trim().is_empty() {
            bail!("{kind} bucket with empty key");
        }
        if !seen.insert(key) {
            bail!("duplicate {kind} bucket `{key}`");
        }
        if !weight.is_finite() || weight < 0.0 {
            bail!("{kind} bucket `{key}` has invalid weight {weight}");
        }
    }
    Ok(())
}

/// `round(weight / 100 * base)`, halves rounded up. May be 0.
pub fn quota(weight: f64, base: usize) -> usize {
    let q = (weight / 100.0 * base as f64).round();
    if q.is_finite() && q > 0.0 {
        q as usize
    } else {
        0
    }
}
