use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use crate::candidate::CandidateDetails;
use crate::item_id::ItemId;
use crate::media::MediaKind;
use crate::status::WatchStatus;
use crate::timestamp::RawTimestamp;

/// Highest valid star rating
pub const MAX_RATING: u8 = 5;

/// A single movie or show record in the user's collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchedItem {
    pub id: ItemId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>, // Localized/original title, also searched
    #[serde(default)]
    pub rating: u8, // 0 = unrated, 1-5 stars
    #[serde(default)]
    pub runtime_minutes: u32, // 0 for series without a single runtime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watched_at: Option<RawTimestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>, // Comma-separated country names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>, // Comma-separated genre names
    pub media_kind: MediaKind,
    #[serde(default)]
    pub status: WatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl WatchedItem {
    /// Document keys this model reads and writes
    pub const FIELDS: &'static [&'static str] = &[
        "id",
        "title",
        "original_title",
        "rating",
        "runtime_minutes",
        "watched_at",
        "country",
        "genre",
        "media_kind",
        "status",
        "poster_path",
        "tmdb_id",
        "added_at",
        "notes",
    ];

    pub fn new(id: impl Into<ItemId>, title: impl Into<String>, media_kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            original_title: None,
            rating: 0,
            runtime_minutes: 0,
            watched_at: None,
            country: None,
            genre: None,
            media_kind,
            status: WatchStatus::History,
            poster_path: None,
            tmdb_id: None,
            added_at: None,
            notes: None,
        }
    }

    /// History item built from a catalog record, keyed by the catalog id
    pub fn from_details(details: CandidateDetails) -> Self {
        let original_title = details.original_title.filter(|t| *t != details.title);
        let join = |values: Vec<String>| (!values.is_empty()).then(|| values.join(", "));
        Self {
            id: ItemId::Numeric(details.id),
            original_title,
            runtime_minutes: details.runtime_minutes,
            country: join(details.countries),
            genre: join(details.genres),
            poster_path: details.poster_path,
            tmdb_id: Some(details.id),
            ..Self::new(ItemId::Numeric(details.id), details.title, details.media_kind)
        }
    }

    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_runtime(mut self, minutes: u32) -> Self {
        self.runtime_minutes = minutes;
        self
    }

    pub fn with_watched_at(mut self, watched_at: impl Into<RawTimestamp>) -> Self {
        self.watched_at = Some(watched_at.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_status(mut self, status: WatchStatus) -> Self {
        self.status = status;
        self
    }

    /// Star rating when it is a valid 1-5 value, regardless of status
    pub fn star_rating(&self) -> Option<u8> {
        (1..=MAX_RATING).contains(&self.rating).then_some(self.rating)
    }

    /// Rating as it applies to rating predicates: only history items carry one
    pub fn effective_rating(&self) -> Option<u8> {
        match self.status {
            WatchStatus::History => Some(if self.rating > MAX_RATING { 0 } else { self.rating }),
            WatchStatus::Watchlist => None,
        }
    }

    pub fn watched_at_millis(&self) -> Option<i64> {
        self.watched_at.as_ref().and_then(RawTimestamp::epoch_millis)
    }

    pub fn watched_year_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<i32> {
        self.watched_at.as_ref().and_then(|ts| ts.year_in(tz))
    }

    pub fn countries(&self) -> impl Iterator<Item = &str> {
        split_tokens(self.country.as_deref())
    }

    pub fn genres(&self) -> impl Iterator<Item = &str> {
        split_tokens(self.genre.as_deref())
    }

    pub fn is_history(&self) -> bool {
        self.status == WatchStatus::History
    }

    pub fn is_watchlist(&self) -> bool {
        self.status == WatchStatus::Watchlist
    }
}

/// Split a comma-separated free-text field into trimmed, non-empty tokens
pub fn split_tokens(field: Option<&str>) -> impl Iterator<Item = &str> {
    field
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_cover_every_serialized_key() {
        let item = WatchedItem::new(ItemId::Numeric(1), "Full", MediaKind::Movie)
            .with_rating(4)
            .with_runtime(90)
            .with_watched_at(RawTimestamp::Millis(0))
            .with_country("France")
            .with_genre("Drama");
        let item = WatchedItem {
            original_title: Some("Plein".to_string()),
            poster_path: Some("/p.jpg".to_string()),
            tmdb_id: Some(1),
            added_at: Some(Utc::now()),
            notes: Some("n".to_string()),
            ..item
        };
        let value = serde_json::to_value(&item).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        let mut fields = WatchedItem::FIELDS.to_vec();
        keys.sort_unstable();
        fields.sort_unstable();
        assert_eq!(keys, fields);
    }

    #[test]
    fn test_minimal_document_uses_defaults() {
        let item: WatchedItem = serde_json::from_str(
            r#"{"id": "a1", "title": "Arrival", "media_kind": "movie"}"#,
        )
        .unwrap();
        assert_eq!(item.status, WatchStatus::History);
        assert_eq!(item.rating, 0);
        assert_eq!(item.runtime_minutes, 0);
        assert!(item.watched_at.is_none());
        assert_eq!(item.watched_at_millis(), None);
    }

    #[test]
    fn test_tokens_are_trimmed_and_skip_empty() {
        let item = WatchedItem::new("a", "A", MediaKind::Movie)
            .with_country(" United States,  France ,,")
            .with_genre("Drama");
        let countries: Vec<&str> = item.countries().collect();
        assert_eq!(countries, vec!["United States", "France"]);
        assert_eq!(item.genres().collect::<Vec<_>>(), vec!["Drama"]);
        assert_eq!(split_tokens(None).count(), 0);
    }

    #[test]
    fn test_effective_rating_ignores_watchlist() {
        let watched = WatchedItem::new("a", "A", MediaKind::Movie).with_rating(4);
        assert_eq!(watched.effective_rating(), Some(4));

        let planned = watched.clone().with_status(WatchStatus::Watchlist);
        assert_eq!(planned.effective_rating(), None);
        assert_eq!(planned.star_rating(), Some(4));

        let malformed = WatchedItem::new("b", "B", MediaKind::Movie).with_rating(9);
        assert_eq!(malformed.star_rating(), None);
        assert_eq!(malformed.effective_rating(), Some(0));
    }

    #[test]
    fn test_from_details() {
        let details = CandidateDetails {
            id: 496243,
            title: "Parasite".to_string(),
            original_title: Some("기생충".to_string()),
            media_kind: MediaKind::Movie,
            runtime_minutes: 133,
            countries: vec!["South Korea".to_string()],
            genres: vec!["Comedy".to_string(), "Thriller".to_string()],
            poster_path: Some("/p.jpg".to_string()),
            release_date: Some("2019-05-30".to_string()),
        };
        let item = WatchedItem::from_details(details);
        assert_eq!(item.id, ItemId::Numeric(496243));
        assert_eq!(item.tmdb_id, Some(496243));
        assert_eq!(item.original_title.as_deref(), Some("기생충"));
        assert_eq!(item.genre.as_deref(), Some("Comedy, Thriller"));
        assert_eq!(item.status, WatchStatus::History);
        assert_eq!(item.rating, 0);
    }
}
