// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod buckets;
pub mod cards;
pub mod config;
pub mod dashboard;
pub mod metrics;
pub mod news;

/// Log filter used by the binaries when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "news_briefing=info,warn";

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::buckets::BucketTables;
pub use crate::config::NewsConfig;
pub use crate::dashboard::{reduce, Action, DashboardState, DisplayMode};
pub use crate::news::{AggregatedStore, Aggregator, Article};
