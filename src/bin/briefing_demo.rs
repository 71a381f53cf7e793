//! Loads the briefing once from the configured source and prints the distributed cards.
//! Point `upstream.fixture_path` (or NEWS_CONFIG_PATH) at a stored response to run offline.

use anyhow::bail;
use chrono::Utc;
use news_briefing::cards::DashboardView;
use news_briefing::{reduce, Action, AppState, DisplayMode, NewsConfig, DEFAULT_LOG_FILTER};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cfg = NewsConfig::load_default()?;
    let app = AppState::from_config(&cfg)?;
    app.reload().await;

    let state = reduce(app.snapshot(), Action::SetMode(DisplayMode::Distribution));
    let view = DashboardView::from_state(&state, Utc::now());

    if let Some(err) = &view.error {
        bail!("{err}");
    }

    println!("Informe Diario de Noticias: {} noticias", view.count);
    for card in &view.cards {
        println!(
            "[{} · {}] {} ({}, {})",
            card.region_name, card.category_name, card.title, card.source_name, card.time_ago
        );
        if !card.summary.is_empty() {
            println!("    {}", card.summary);
        }
    }
    Ok(())
}
