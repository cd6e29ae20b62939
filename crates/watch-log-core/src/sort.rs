// Collection ordering

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use watch_log_models::WatchedItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Date,
    Title,
    Runtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Title => "title",
            SortKey::Runtime => "runtime",
        }
    }
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" | "watched" => Ok(SortKey::Date),
            "title" | "name" => Ok(SortKey::Title),
            "runtime" | "length" => Ok(SortKey::Runtime),
            _ => Err(format!("Invalid sort key: {} (expected date, title or runtime)", s)),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            _ => Err(format!("Invalid sort order: {} (expected asc or desc)", s)),
        }
    }
}

/// Case-folded comparison first so "alien" and "Alien" sit together, raw text breaks the tie
fn compare_titles(a: &str, b: &str) -> Ordering {
    let folded = a.to_lowercase().cmp(&b.to_lowercase());
    folded.then_with(|| a.cmp(b))
}

/// Ascending comparison for a key. Missing runtimes and dates compare as 0.
pub fn compare_by(key: SortKey, a: &WatchedItem, b: &WatchedItem) -> Ordering {
    match key {
        SortKey::Title => compare_titles(&a.title, &b.title),
        SortKey::Runtime => a.runtime_minutes.cmp(&b.runtime_minutes),
        SortKey::Date => a
            .watched_at_millis()
            .unwrap_or(0)
            .cmp(&b.watched_at_millis().unwrap_or(0)),
    }
}

/// Stable sort into a new vector; the input is left untouched.
/// Descending reverses each comparison, so equal items keep their input order either way.
pub fn sort_items(items: &[WatchedItem], key: SortKey, order: SortOrder) -> Vec<WatchedItem> {
    let mut sorted = items.to_vec();
    match order {
        SortOrder::Ascending => sorted.sort_by(|a, b| compare_by(key, a, b)),
        SortOrder::Descending => sorted.sort_by(|a, b| compare_by(key, a, b).reverse()),
    }
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use watch_log_models::{MediaKind, RawTimestamp};

    fn titles(items: &[WatchedItem]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    fn create_item(title: &str, runtime: u32, watched: Option<RawTimestamp>) -> WatchedItem {
        let mut item = WatchedItem::new(title, title, MediaKind::Movie).with_runtime(runtime);
        item.watched_at = watched;
        item
    }

    fn sample() -> Vec<WatchedItem> {
        vec![
            create_item("beta", 90, Some(RawTimestamp::Seconds { seconds: 1_700_000_000 })),
            create_item("Alpha", 120, Some(RawTimestamp::Millis(1_600_000_000_000))),
            create_item(
                "gamma",
                0,
                Some(RawTimestamp::Store { seconds: 1_650_000_000, nanoseconds: 500_000_000 }),
            ),
            create_item(
                "Delta",
                45,
                Some(RawTimestamp::Native(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())),
            ),
        ]
    }

    #[test]
    fn test_sort_by_title_case_insensitive() {
        let sorted = sort_items(&sample(), SortKey::Title, SortOrder::Ascending);
        assert_eq!(titles(&sorted), vec!["Alpha", "beta", "Delta", "gamma"]);
    }

    #[test]
    fn test_sort_by_date_mixed_representations() {
        let sorted = sort_items(&sample(), SortKey::Date, SortOrder::Ascending);
        assert_eq!(titles(&sorted), vec!["Alpha", "gamma", "beta", "Delta"]);
    }

    #[test]
    fn test_missing_date_sorts_as_zero() {
        let mut items = sample();
        items.push(create_item("undated", 10, None));
        items.push(create_item(
            "garbled",
            10,
            Some(RawTimestamp::Unrecognized(serde_json::json!({"when": "later"}))),
        ));
        let sorted = sort_items(&items, SortKey::Date, SortOrder::Ascending);
        assert_eq!(&titles(&sorted)[..2], &["undated", "garbled"]);
    }

    #[test]
    fn test_sort_does_not_mutate_input() {
        let items = sample();
        let before = items.clone();
        let _ = sort_items(&items, SortKey::Runtime, SortOrder::Descending);
        assert_eq!(items, before);
    }

    #[test]
    fn test_descending_is_exact_reverse_without_ties() {
        let items = sample();
        for key in [SortKey::Date, SortKey::Title, SortKey::Runtime] {
            let asc = sort_items(&items, key, SortOrder::Ascending);
            let mut desc = sort_items(&items, key, SortOrder::Descending);
            desc.reverse();
            assert_eq!(asc, desc, "key {}", key);
        }
    }

    #[test]
    fn test_sort_is_stable_and_deterministic() {
        let items = vec![
            create_item("first", 100, None),
            create_item("second", 100, None),
            create_item("third", 50, None),
        ];
        let once = sort_items(&items, SortKey::Runtime, SortOrder::Descending);
        let twice = sort_items(&items, SortKey::Runtime, SortOrder::Descending);
        assert_eq!(once, twice);
        assert_eq!(titles(&once), vec!["first", "second", "third"]);

        let asc = sort_items(&items, SortKey::Runtime, SortOrder::Ascending);
        assert_eq!(titles(&asc), vec!["third", "first", "second"]);

        // Same result from any starting permutation when there are no ties
        let mut shuffled = sample();
        shuffled.rotate_left(2);
        assert_eq!(
            sort_items(&shuffled, SortKey::Title, SortOrder::Ascending),
            sort_items(&sample(), SortKey::Title, SortOrder::Ascending)
        );
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("DATE".parse::<SortKey>(), Ok(SortKey::Date));
        assert_eq!("desc".parse::<SortOrder>(), Ok(SortOrder::Descending));
        assert!("rating".parse::<SortKey>().is_err());
        assert_eq!(SortOrder::Ascending.to_string(), "asc");
        assert_eq!(SortOrder::Ascending.reversed(), SortOrder::Descending);
    }
}
