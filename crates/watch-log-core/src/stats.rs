// Collection statistics

use chrono::{Local, TimeZone};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use watch_log_models::watched_item::MAX_RATING;
use watch_log_models::{MediaKind, WatchedItem};

pub const MINUTES_PER_DAY: u64 = 1440;
pub const MINUTES_PER_HOUR: u64 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeBreakdown {
    pub total_minutes: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
}

impl RuntimeBreakdown {
    pub fn from_minutes(total_minutes: u64) -> Self {
        Self {
            total_minutes,
            days: total_minutes / MINUTES_PER_DAY,
            hours: (total_minutes % MINUTES_PER_DAY) / MINUTES_PER_HOUR,
            minutes: total_minutes % MINUTES_PER_HOUR,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSummary {
    pub total_items: usize,
    pub runtime: RuntimeBreakdown,
    /// Mean of 1-5 ratings; 0 when nothing is rated
    pub average_rating: f64,
    pub rated_items: usize,
    pub by_year: BTreeMap<i32, usize>,
    /// Keys 1 through 5, always present
    pub by_rating: BTreeMap<u8, usize>,
    pub by_country: HashMap<String, usize>,
    pub by_genre: HashMap<String, usize>,
    pub by_kind: BTreeMap<MediaKind, usize>,
}

impl StatsSummary {
    pub fn is_empty(&self) -> bool {
        self.total_items == 0
    }
}

/// Aggregate with watch years taken in the local time zone
pub fn aggregate(items: &[WatchedItem]) -> StatsSummary {
    aggregate_in(items, &Local)
}

/// Items missing a field only drop out of that field's grouping
pub fn aggregate_in<Tz: TimeZone>(items: &[WatchedItem], tz: &Tz) -> StatsSummary {
    let mut summary = StatsSummary {
        total_items: items.len(),
        by_rating: (1..=MAX_RATING).map(|r| (r, 0)).collect(),
        ..StatsSummary::default()
    };

    let mut total_minutes: u64 = 0;
    let mut rating_sum: u64 = 0;
    let mut country_keys = HashMap::new();
    let mut genre_keys = HashMap::new();

    for item in items {
        total_minutes += u64::from(item.runtime_minutes);

        if let Some(rating) = item.star_rating() {
            rating_sum += u64::from(rating);
            summary.rated_items += 1;
            *summary.by_rating.entry(rating).or_insert(0) += 1;
        }

        if let Some(year) = item.watched_year_in(tz) {
            *summary.by_year.entry(year).or_insert(0) += 1;
        }

        count_tokens(&mut summary.by_country, &mut country_keys, item.countries());
        count_tokens(&mut summary.by_genre, &mut genre_keys, item.genres());

        *summary.by_kind.entry(item.media_kind).or_insert(0) += 1;
    }

    summary.runtime = RuntimeBreakdown::from_minutes(total_minutes);
    if summary.rated_items > 0 {
        summary.average_rating = rating_sum as f64 / summary.rated_items as f64;
    }
    summary
}

/// Each distinct token counts once per item. Tokens group case-insensitively
/// under the first spelling seen; `keys` maps the folded form to that spelling.
fn count_tokens<'a>(
    counts: &mut HashMap<String, usize>,
    keys: &mut HashMap<String, String>,
    tokens: impl Iterator<Item = &'a str>,
) {
    let mut seen: Vec<String> = Vec::new();
    for token in tokens {
        let folded = token.to_lowercase();
        if seen.contains(&folded) {
            continue;
        }
        let key = keys
            .entry(folded.clone())
            .or_insert_with(|| token.to_string())
            .clone();
        seen.push(folded);
        *counts.entry(key).or_insert(0) += 1;
    }
}

/// Highest counts first, ties by key, at most `n` entries
pub fn top_entries(counts: &HashMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}
