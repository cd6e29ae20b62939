// Collection filtering over in-memory snapshots

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use watch_log_models::{MediaKind, WatchStatus, WatchedItem};

/// Media kind predicate; `All` never excludes anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MediaKindFilter {
    #[default]
    All,
    Only(MediaKind),
}

impl MediaKindFilter {
    pub fn matches(&self, kind: MediaKind) -> bool {
        match self {
            MediaKindFilter::All => true,
            MediaKindFilter::Only(wanted) => *wanted == kind,
        }
    }
}

impl fmt::Display for MediaKindFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKindFilter::All => f.write_str("all"),
            MediaKindFilter::Only(kind) => write!(f, "{}", kind),
        }
    }
}

impl FromStr for MediaKindFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(MediaKindFilter::All);
        }
        s.parse::<MediaKind>().map(MediaKindFilter::Only)
    }
}

/// Conjunction of predicates. Every field is optional; unset fields are inactive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Case-insensitive substring of `title` or `original_title`
    pub text_query: Option<String>,
    /// Minimum star rating. Applies to history items only; 0 is inactive.
    pub min_rating: Option<u8>,
    /// Calendar year of `watched_at`
    pub year: Option<i32>,
    /// Case-insensitive substring of any country token
    pub country_contains: Option<String>,
    #[serde(default)]
    pub media_kind: MediaKindFilter,
    pub status: Option<WatchStatus>,
}

impl FilterSpec {
    pub fn with_text(mut self, query: impl Into<String>) -> Self {
        self.text_query = Some(query.into());
        self
    }

    pub fn with_min_rating(mut self, rating: u8) -> Self {
        self.min_rating = Some(rating);
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country_contains = Some(country.into());
        self
    }

    pub fn with_media_kind(mut self, kind: MediaKind) -> Self {
        self.media_kind = MediaKindFilter::Only(kind);
        self
    }

    pub fn with_status(mut self, status: WatchStatus) -> Self {
        self.status = Some(status);
        self
    }

    fn text_needle(&self) -> Option<String> {
        self.text_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    fn country_needle(&self) -> Option<String> {
        self.country_contains
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_lowercase)
    }

    fn active_min_rating(&self) -> Option<u8> {
        self.min_rating.filter(|r| *r > 0)
    }

    /// True when at least one predicate would exclude something
    pub fn is_active(&self) -> bool {
        self.text_needle().is_some()
            || self.active_min_rating().is_some()
            || self.year.is_some()
            || self.country_needle().is_some()
            || self.media_kind != MediaKindFilter::All
            || self.status.is_some()
    }
}

/// Predicates with their needles lowercased once per pass
struct CompiledFilter<'a, Tz: TimeZone> {
    spec: &'a FilterSpec,
    text: Option<String>,
    country: Option<String>,
    min_rating: Option<u8>,
    tz: &'a Tz,
}

impl<'a, Tz: TimeZone> CompiledFilter<'a, Tz> {
    fn new(spec: &'a FilterSpec, tz: &'a Tz) -> Self {
        Self {
            spec,
            text: spec.text_needle(),
            country: spec.country_needle(),
            min_rating: spec.active_min_rating(),
            tz,
        }
    }

    fn matches(&self, item: &WatchedItem) -> bool {
        if let Some(ref needle) = self.text {
            let in_title = item.title.to_lowercase().contains(needle.as_str());
            let in_original = item
                .original_title
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(needle.as_str()));
            if !in_title && !in_original {
                return false;
            }
        }

        if let Some(min) = self.min_rating {
            // Watchlist items have no rating to compare
            match item.effective_rating() {
                Some(rating) if rating >= min => {}
                _ => return false,
            }
        }

        if let Some(year) = self.spec.year {
            if item.watched_year_in(self.tz) != Some(year) {
                return false;
            }
        }

        if let Some(ref needle) = self.country {
            if !item
                .countries()
                .any(|token| token.to_lowercase().contains(needle.as_str()))
            {
                return false;
            }
        }

        if !self.spec.media_kind.matches(item.media_kind) {
            return false;
        }

        if let Some(status) = self.spec.status {
            if item.status != status {
                return false;
            }
        }

        true
    }
}

/// Filter with the year predicate evaluated in the local time zone
pub fn filter_items(items: &[WatchedItem], spec: &FilterSpec) -> Vec<WatchedItem> {
    filter_items_in(items, spec, &Local)
}

/// Filter with the year predicate evaluated in `tz`.
/// Order is preserved; an inactive spec returns every item.
pub fn filter_items_in<Tz: TimeZone>(items: &[WatchedItem], spec: &FilterSpec, tz: &Tz) -> Vec<WatchedItem> {
    if !spec.is_active() {
        return items.to_vec();
    }

    let compiled = CompiledFilter::new(spec, tz);
    let filtered: Vec<WatchedItem> = items
        .iter()
        .filter(|item| compiled.matches(item))
        .cloned()
        .collect();

    debug!(
        "filter_items: input_count={}, output_count={}",
        items.len(),
        filtered.len()
    );
    filtered
}
