use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::buckets::BucketTables;
use crate::cards::DashboardView;
use crate::config::NewsConfig;
use crate::dashboard::{reduce, Action, DashboardState, DisplayMode, LOAD_ERROR_MESSAGE};
use crate::news::client::source_from_config;
use crate::news::{AggregateOptions, Aggregator};

#[derive(Clone)]
pub struct AppState {
    dashboard: Arc<RwLock<DashboardState>>,
    aggregator: Aggregator,
    /// Serialises the first load so concurrent page views share it.
    first_load: Arc<tokio::sync::Mutex<()>>,
}

impl AppState {
    pub fn new(aggregator: Aggregator, total_count: usize) -> Self {
        let state = DashboardState::new(aggregator.tables().clone(), total_count);
        Self {
            dashboard: Arc::new(RwLock::new(state)),
            aggregator,
            first_load: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn from_config(cfg: &NewsConfig) -> Result<Self> {
        let source = source_from_config(&cfg.upstream)?;
        let tables = Arc::new(cfg.tables());
        let aggregator = Aggregator::new(source, tables, AggregateOptions::from(&cfg.upstream));
        Ok(Self::new(aggregator, cfg.display.total_count))
    }

    fn read(&self) -> RwLockReadGuard<'_, DashboardState> {
        self.dashboard.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> DashboardState {
        self.read().clone()
    }

    pub fn dispatch(&self, action: Action) {
        let mut guard = self.dashboard.write().unwrap_or_else(PoisonError::into_inner);
        let current = guard.clone();
        *guard = reduce(current, action);
    }

    /// Rebuild the store wholesale from upstream.
    pub async fn reload(&self) {
        match self.aggregator.run().await {
            Ok(store) => {
                info!(articles = store.len(), "dashboard store reloaded");
                self.dispatch(Action::Loaded(store));
            }
            Err(e) => {
                error!(error = ?e, "news load failed");
                self.dispatch(Action::LoadFailed(LOAD_ERROR_MESSAGE.to_string()));
            }
        }
    }

    /// Load once on the first page view. Callers arriving during that load
    /// wait for it instead of starting their own.
    pub async fn ensure_loaded(&self) {
        if self.read().is_loaded() {
            return;
        }
        let _gate = self.first_load.lock().await;
        let loaded = self.read().is_loaded();
        if !loaded {
            self.reload().await;
        }
    }

    fn view(&self) -> DashboardView {
        DashboardView::from_state(&self.read(), chrono::Utc::now())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/news", get(news))
        .route("/news/reload", post(reload_news))
        .route("/buckets", get(buckets))
        .route("/toggle/region/{key}", post(toggle_region))
        .route("/toggle/category/{key}", post(toggle_category))
        .route("/toggle/mode", post(toggle_mode))
        .route("/mode/{mode}", post(set_mode))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Per-request overrides; the shared state is left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub mode: Option<DisplayMode>,
    /// Comma separated region keys.
    pub regions: Option<String>,
    /// Comma separated category keys.
    pub categories: Option<String>,
}

fn split_keys(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

async fn news(State(state): State<AppState>, Query(q): Query<ViewQuery>) -> Json<DashboardView> {
    state.ensure_loaded().await;

    let mut snap = state.snapshot();
    if let Some(mode) = q.mode {
        snap.mode = mode;
    }
    if let Some(r) = q.regions.as_deref() {
        snap.selected_regions = split_keys(r);
    }
    if let Some(c) = q.categories.as_deref() {
        snap.selected_categories = split_keys(c);
    }
    Json(DashboardView::from_state(&snap, chrono::Utc::now()))
}

async fn reload_news(State(state): State<AppState>) -> Json<DashboardView> {
    state.reload().await;
    Json(state.view())
}

#[derive(Serialize)]
struct BucketOut {
    key: String,
    name: String,
    weight: f64,
    label: String,
    selected: bool,
}

#[derive(Serialize)]
struct BucketsOut {
    mode: DisplayMode,
    regions: Vec<BucketOut>,
    categories: Vec<BucketOut>,
}

fn percent_label(w: f64) -> String {
    if w.fract() == 0.0 {
        format!("{w:.0}%")
    } else {
        format!("{w}%")
    }
}

fn bucket_rows(
    tables: &BucketTables,
    regions: &[String],
    categories: &[String],
) -> (Vec<BucketOut>, Vec<BucketOut>) {
    let r = tables
        .regions
        .iter()
        .map(|b| BucketOut {
            key: b.key.clone(),
            name: tables.region_name(&b.key).to_string(),
            weight: b.weight,
            label: percent_label(b.weight),
            selected: regions.contains(&b.key),
        })
        .collect();
    let c = tables
        .categories
        .iter()
        .map(|b| BucketOut {
            key: b.key.clone(),
            name: tables.category_name(&b.key).to_string(),
            weight: b.weight,
            label: percent_label(b.weight),
            selected: categories.contains(&b.key),
        })
        .collect();
    (r, c)
}

async fn buckets(State(state): State<AppState>) -> Json<BucketsOut> {
    let snap = state.read();
    let (regions, categories) = bucket_rows(
        &snap.tables,
        &snap.selected_regions,
        &snap.selected_categories,
    );
    Json(BucketsOut {
        mode: snap.mode,
        regions,
        categories,
    })
}

async fn toggle_region(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DashboardView> {
    state.dispatch(Action::ToggleRegion(key));
    Json(state.view())
}

async fn toggle_category(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DashboardView> {
    state.dispatch(Action::ToggleCategory(key));
    Json(state.view())
}

async fn toggle_mode(State(state): State<AppState>) -> Json<DashboardView> {
    state.dispatch(Action::ToggleMode);
    Json(state.view())
}

async fn set_mode(
    State(state): State<AppState>,
    Path(mode): Path<DisplayMode>,
) -> Json<DashboardView> {
    state.dispatch(Action::SetMode(mode));
    Json(state.view())
}
