use crate::output::styled_table;
use chrono::Local;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use watch_log_models::{Candidate, WatchedItem};
use watch_log_models::watched_item::MAX_RATING;

pub fn stars(rating: u8) -> String {
    if rating == 0 || rating > MAX_RATING {
        return "-".to_string();
    }
    let filled = usize::from(rating);
    format!("{}{}", "★".repeat(filled), "☆".repeat(usize::from(MAX_RATING) - filled))
}

pub fn runtime(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, 0) => "-".to_string(),
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

pub fn watched_date(item: &WatchedItem) -> String {
    item.watched_at
        .as_ref()
        .and_then(|ts| ts.to_datetime())
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn item_table(items: &[WatchedItem]) -> Table {
    let mut table = styled_table(["ID", "Title", "Kind", "Status", "Rating", "Runtime", "Watched", "Country"]);
    for item in items {
        let title = match item.original_title.as_deref() {
            Some(original) if original != item.title => format!("{}\n{}", item.title, original.bright_black()),
            _ => item.title.clone(),
        };
        table.add_row(vec![
            Cell::new(item.id.to_string()),
            Cell::new(title),
            Cell::new(item.media_kind.to_string()),
            Cell::new(item.status.to_string()),
            Cell::new(stars(item.rating)),
            Cell::new(runtime(item.runtime_minutes)),
            Cell::new(watched_date(item)),
            Cell::new(item.country.as_deref().unwrap_or("-")),
        ]);
    }
    table
}

pub fn candidate_table(candidates: &[Candidate]) -> Table {
    let mut table = styled_table(["TMDB ID", "Title", "Kind", "Year", "Score"]);
    for candidate in candidates {
        table.add_row(vec![
            Cell::new(candidate.id.to_string()),
            Cell::new(&candidate.title),
            Cell::new(candidate.media_kind.map_or("-".to_string(), |k| k.to_string())),
            Cell::new(candidate.release_year().map_or("-".to_string(), |y| y.to_string())),
            Cell::new(candidate.vote_average.map_or("-".to_string(), |v| format!("{:.1}", v))),
        ]);
    }
    table
}

/// "‹ 3 4 [5] 6 7 ›" style page strip
pub fn page_strip(window: &[usize], current: usize, total: usize) -> String {
    let mut parts = Vec::with_capacity(window.len() + 2);
    if current > 1 {
        parts.push("‹".to_string());
    }
    for page in window {
        if *page == current {
            parts.push(format!("[{}]", page).bold().to_string());
        } else {
            parts.push(page.to_string());
        }
    }
    if current < total {
        parts.push("›".to_string());
    }
    parts.join(" ")
}
