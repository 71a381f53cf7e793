//! # News cards
//! View models for the briefing page: badges, a cleaned summary, a Spanish
//! long date and a Spanish "time ago" label.

use chrono::{DateTime, Datelike, Timelike, Utc};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::buckets::BucketTables;
use crate::dashboard::{DashboardState, DisplayMode};
use crate::news::Article;

pub const SUMMARY_MAX_CHARS: usize = 150;

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsCard {
    pub id: String,
    pub title: String,
    pub link: String,
    pub image_url: Option<String>,
    pub region: String,
    pub region_name: String,
    pub category: String,
    pub category_name: String,
    pub source_name: String,
    pub summary: String,
    pub published_at: Option<DateTime<Utc>>,
    pub published_label: String,
    pub time_ago: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub mode: DisplayMode,
    pub status: &'static str,
    pub error: Option<String>,
    pub count: usize,
    pub selected_regions: Vec<String>,
    pub selected_categories: Vec<String>,
    pub cards: Vec<NewsCard>,
}

impl DashboardView {
    pub fn from_state(state: &DashboardState, now: DateTime<Utc>) -> Self {
        let cards: Vec<NewsCard> = state
            .visible()
            .iter()
            .map(|a| NewsCard::from_article(a, &state.tables, now))
            .collect();
        Self {
            mode: state.mode,
            status: state.status.label(),
            error: state.error().map(str::to_string),
            count: cards.len(),
            selected_regions: state.selected_regions.clone(),
            selected_categories: state.selected_categories.clone(),
            cards,
        }
    }
}

impl NewsCard {
    pub fn from_article(a: &Article, tables: &BucketTables, now: DateTime<Utc>) -> Self {
        let raw = &a.raw;
        let summary = match raw.description.as_deref().map(normalize_text) {
            Some(d) if !d.is_empty() => d,
            _ => truncate_text(
                &normalize_text(raw.content.as_deref().unwrap_or_default()),
                SUMMARY_MAX_CHARS,
            ),
        };
        Self {
            id: raw.article_id.clone(),
            title: normalize_text(&raw.title),
            link: raw.link.clone(),
            image_url: raw.image_url.clone().filter(|u| !u.trim().is_empty()),
            region: a.region.clone(),
            region_name: tables.region_name(&a.region).to_string(),
            category: a.category_type.clone(),
            category_name: tables.category_name(&a.category_type).to_string(),
            source_name: raw.source_name.clone(),
            summary,
            published_at: a.published_at,
            published_label: a.published_at.map(format_date_es).unwrap_or_default(),
            time_ago: a
                .published_at
                .map(|p| time_ago_es(p, now))
                .unwrap_or_default(),
        }
    }
}

/// Decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Cut to `max_chars` characters and append `...` when anything was cut.
pub fn truncate_text(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

/// `3 de enero de 2024, 10:05` (UTC).
pub fn format_date_es(dt: DateTime<Utc>) -> String {
    let month = MONTHS_ES[dt.month0() as usize];
    format!(
        "{} de {} de {}, {:02}:{:02}",
        dt.day(),
        month,
        dt.year(),
        dt.hour(),
        dt.minute()
    )
}

/// `hace 3 días`, `hace 1 hora`, ... Future dates read as `hace unos segundos`.
pub fn time_ago_es(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    let steps: [(i64, &str, &str); 5] = [
        (31_536_000, "año", "años"),
        (2_592_000, "mes", "meses"),
        (86_400, "día", "días"),
        (3_600, "hora", "horas"),
        (60, "minuto", "minutos"),
    ];
    for (unit, one, many) in steps {
        let n = seconds.div_euclid(unit);
        if n >= 1 {
            return if n == 1 {
                format!("hace 1 {one}")
            } else {
                format!("hace {n} {many}")
            };
        }
    }
    "hace unos segundos".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::RawArticle;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn normalize_strips_tags_and_entities() {
        assert_eq!(
            normalize_text("  <p>Hola&nbsp;&amp;\n adiós</p> "),
            "Hola & adiós"
        );
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_text("ñañaña", 3), "ñañ...");
        assert_eq!(truncate_text("abc", 3), "abc");
    }

    #[test]
    fn spanish_long_date() {
        assert_eq!(format_date_es(at(2024, 1, 3, 10, 5)), "3 de enero de 2024, 10:05");
        assert_eq!(format_date_es(at(2023, 12, 31, 0, 0)), "31 de diciembre de 2023, 00:00");
    }

    #[test]
    fn time_ago_units() {
        let now = at(2024, 6, 1, 12, 0);
        assert_eq!(time_ago_es(now, now), "hace unos segundos");
        assert_eq!(time_ago_es(at(2024, 6, 1, 11, 59), now), "hace 1 minuto");
        assert_eq!(time_ago_es(at(2024, 6, 1, 9, 0), now), "hace 3 horas");
        assert_eq!(time_ago_es(at(2024, 5, 31, 12, 0), now), "hace 1 día");
        assert_eq!(time_ago_es(at(2024, 4, 1, 12, 0), now), "hace 2 meses");
        assert_eq!(time_ago_es(at(2022, 6, 1, 12, 0), now), "hace 2 años");
        assert_eq!(time_ago_es(at(2024, 6, 2, 12, 0), now), "hace unos segundos");
    }

    #[test]
    fn card_falls_back_to_truncated_content() {
        let raw = RawArticle::from_value(&serde_json::json!({
            "article_id": "a",
            "title": "Título",
            "description": "   ",
            "content": "x".repeat(200),
            "pubDate": "2024-01-03 10:05:00",
            "image_url": "",
            "source_name": "El Diario"
        }))
        .unwrap();
        let a = Article::tag(raw, "romania", "geopolitics");
        let card = NewsCard::from_article(&a, &BucketTables::default(), at(2024, 1, 3, 12, 5));
        assert_eq!(card.summary.chars().count(), SUMMARY_MAX_CHARS + 3);
        assert_eq!(card.region_name, "Rumanía");
        assert_eq!(card.category_name, "Geopolítica");
        assert_eq!(card.image_url, None);
        assert_eq!(card.published_label, "3 de enero de 2024, 10:05");
        assert_eq!(card.time_ago, "hace 2 horas");
    }
}
