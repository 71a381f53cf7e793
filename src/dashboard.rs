//! # Dashboard state
//! Explicit state for the briefing page plus a pure `reduce` function.
//! No I/O; loads happen outside and are fed back in as actions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::buckets::BucketTables;
use crate::news::{distribute, select, AggregatedStore, Article};

/// User-visible message for a load where nothing could be fetched.
pub const LOAD_ERROR_MESSAGE: &str =
    "Error al cargar las noticias. Por favor, intente de nuevo más tarde.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Distribution,
    Filtered,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Distribution => DisplayMode::Filtered,
            DisplayMode::Filtered => DisplayMode::Distribution,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading,
    Ready,
    Failed(String),
}

impl LoadStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LoadStatus::Loading => "loading",
            LoadStatus::Ready => "ready",
            LoadStatus::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    Loaded(AggregatedStore),
    LoadFailed(String),
    ToggleRegion(String),
    ToggleCategory(String),
    ToggleMode,
    SetMode(DisplayMode),
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub status: LoadStatus,
    pub store: AggregatedStore,
    pub mode: DisplayMode,
    pub selected_regions: Vec<String>,
    pub selected_categories: Vec<String>,
    pub total_count: usize,
    pub tables: Arc<BucketTables>,
}

impl DashboardState {
    /// Loading, distribution mode, everything selected.
    pub fn new(tables: Arc<BucketTables>, total_count: usize) -> Self {
        Self {
            status: LoadStatus::Loading,
            store: AggregatedStore::new(),
            mode: DisplayMode::Distribution,
            selected_regions: tables.region_keys(),
            selected_categories: tables.category_keys(),
            total_count,
            tables,
        }
    }

    pub fn is_loaded(&self) -> bool {
        !matches!(self.status, LoadStatus::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Failed(msg) => Some(msg.as_str()),
            _ => None,
        }
    }

    /// Articles to render for the current mode.
    pub fn visible(&self) -> Vec<Article> {
        if self.status != LoadStatus::Ready {
            return Vec::new();
        }
        match self.mode {
            DisplayMode::Distribution => distribute(&self.store, &self.tables, self.total_count),
            DisplayMode::Filtered => select(
                &self.store,
                &self.selected_regions,
                &self.selected_categories,
            ),
        }
    }
}

pub fn reduce(mut state: DashboardState, action: Action) -> DashboardState {
    match action {
        Action::Loaded(store) => {
            state.store = store;
            state.status = LoadStatus::Ready;
        }
        Action::LoadFailed(msg) => {
            state.store = AggregatedStore::new();
            state.status = LoadStatus::Failed(msg);
        }
        Action::ToggleRegion(key) => {
            if state.tables.region(&key).is_some() {
                toggle(&mut state.selected_regions, key);
            }
        }
        Action::ToggleCategory(key) => {
            if state.tables.category(&key).is_some() {
                toggle(&mut state.selected_categories, key);
            }
        }
        Action::ToggleMode => state.mode = state.mode.toggled(),
        Action::SetMode(mode) => state.mode = mode,
    }
    state
}

fn toggle(selected: &mut Vec<String>, key: String) {
    if let Some(pos) = selected.iter().position(|k| *k == key) {
        selected.remove(pos);
    } else {
        selected.push(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::RawArticle;

    fn state() -> DashboardState {
        DashboardState::new(Arc::new(BucketTables::default()), 30)
    }

    fn store() -> AggregatedStore {
        let raw = RawArticle::from_value(&serde_json::json!({
            "article_id": "p1", "title": "t", "pubDate": "2024-01-01 00:00:00"
        }))
        .unwrap();
        let mut s = AggregatedStore::new();
        s.extend("portugal", vec![Article::tag(raw, "portugal", "economy")]);
        s
    }

    #[test]
    fn initial_state_selects_everything() {
        let s = state();
        assert_eq!(s.status, LoadStatus::Loading);
        assert_eq!(s.mode, DisplayMode::Distribution);
        assert_eq!(s.selected_regions.len(), 5);
        assert_eq!(s.selected_categories.len(), 4);
        assert!(s.visible().is_empty());
    }

    #[test]
    fn toggles_remove_then_append() {
        let s = reduce(state(), Action::ToggleRegion("spain".into()));
        assert!(!s.selected_regions.contains(&"spain".to_string()));
        let s = reduce(s, Action::ToggleRegion("spain".into()));
        assert_eq!(s.selected_regions.last().map(String::as_str), Some("spain"));
        let s = reduce(s, Action::ToggleRegion("mars".into()));
        assert_eq!(s.selected_regions.len(), 5);
    }

    #[test]
    fn mode_switches_between_paths() {
        let s = reduce(state(), Action::Loaded(store()));
        // portugal: 10% of 30 = 3, economy 30% of 3 = 1
        assert_eq!(s.visible().len(), 1);

        let s = reduce(s, Action::ToggleMode);
        assert_eq!(s.mode, DisplayMode::Filtered);
        let s = reduce(s, Action::ToggleCategory("economy".into()));
        assert!(s.visible().is_empty());
    }

    #[test]
    fn failed_load_clears_store_and_exposes_message() {
        let s = reduce(state(), Action::Loaded(store()));
        let s = reduce(s, Action::LoadFailed(LOAD_ERROR_MESSAGE.into()));
        assert_eq!(s.error(), Some(LOAD_ERROR_MESSAGE));
        assert!(s.store.is_empty());
        assert!(s.visible().is_empty());
        assert!(s.is_loaded());
    }
}
