//! CSV import and export of collection items.
//!
//! Columns: `id,title,original_title,rating,runtime_minutes,watched_at,country,genre,media_kind,status`.
//! Only `title` is required; unparseable optional fields are dropped with a warning
//! rather than rejecting the row.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Read, Write};
use tracing::{debug, warn};
use watch_log_models::{ItemId, MediaKind, RawTimestamp, WatchStatus, WatchedItem};
use crate::error::{SourceError, SourceResult};
use crate::identity::UserId;
use crate::progress::{ProgressCounts, ProgressTracker};
use crate::traits::DocumentStore;

#[derive(Debug, Serialize, Deserialize, Default)]
struct CsvRow {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    original_title: Option<String>,
    #[serde(default)]
    rating: Option<String>,
    #[serde(default)]
    runtime_minutes: Option<String>,
    #[serde(default)]
    watched_at: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    media_kind: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// A row that could not become an item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct CsvImport {
    pub items: Vec<WatchedItem>,
    pub rejected: Vec<RejectedRow>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse a watch date written by hand: RFC 3339, `YYYY-MM-DD`, or epoch seconds/milliseconds
pub fn parse_watched_at(raw: &str) -> Option<RawTimestamp> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(RawTimestamp::Native(dt.with_timezone(&Utc)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| RawTimestamp::Native(naive.and_utc()));
    }
    if let Ok(n) = raw.parse::<i64>() {
        // Anything past year 5138 in seconds is really milliseconds
        return Some(if n.abs() >= 100_000_000_000 {
            RawTimestamp::Millis(n)
        } else {
            RawTimestamp::Seconds { seconds: n }
        });
    }
    None
}

fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

fn row_to_item(row: CsvRow, line: u64) -> Result<WatchedItem, String> {
    let title = non_empty(row.title).ok_or_else(|| "missing title".to_string())?;

    let media_kind = match non_empty(row.media_kind) {
        Some(kind) => kind.parse::<MediaKind>()?,
        None => MediaKind::Movie,
    };

    let id = match non_empty(row.id) {
        Some(id) => ItemId::parse(&id),
        None => ItemId::Text(format!("csv-{}-{}", line, slug(&title))),
    };

    let mut item = WatchedItem::new(id, title, media_kind);
    item.original_title = non_empty(row.original_title);
    item.country = non_empty(row.country);
    item.genre = non_empty(row.genre);

    if let Some(status) = non_empty(row.status) {
        item.status = status.parse::<WatchStatus>()?;
    }

    if let Some(rating) = non_empty(row.rating) {
        match rating.parse::<u8>() {
            Ok(r) if r <= 5 => item.rating = r,
            _ => warn!(line, "Ignoring invalid rating {:?}", rating),
        }
    }

    if let Some(runtime) = non_empty(row.runtime_minutes) {
        match runtime.parse::<u32>() {
            Ok(r) => item.runtime_minutes = r,
            Err(_) => warn!(line, "Ignoring invalid runtime {:?}", runtime),
        }
    }

    if let Some(watched_at) = non_empty(row.watched_at) {
        match parse_watched_at(&watched_at) {
            Some(ts) => item.watched_at = Some(ts),
            None => warn!(line, "Ignoring unrecognized watch date {:?}", watched_at),
        }
    }

    Ok(item)
}

/// Read items from CSV. Rows without a title or with an invalid kind/status are rejected.
pub fn read_items<R: Read>(reader: R) -> SourceResult<CsvImport> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut import = CsvImport::default();
    for (idx, record) in csv_reader.deserialize::<CsvRow>().enumerate() {
        // Header is line 1
        let line = idx as u64 + 2;
        let row = match record {
            Ok(row) => row,
            Err(e) => {
                import.rejected.push(RejectedRow { line, reason: e.to_string() });
                continue;
            }
        };
        match row_to_item(row, line) {
            Ok(item) => import.items.push(item),
            Err(reason) => {
                debug!(line, "Rejected CSV row: {}", reason);
                import.rejected.push(RejectedRow { line, reason });
            }
        }
    }
    Ok(import)
}

/// Write items as CSV, returning the number of rows written
pub fn write_items<W: Write>(writer: W, items: &[WatchedItem]) -> SourceResult<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for item in items {
        let row = CsvRow {
            id: Some(item.id.to_string()),
            title: Some(item.title.clone()),
            original_title: item.original_title.clone(),
            rating: Some(item.rating.to_string()),
            runtime_minutes: Some(item.runtime_minutes.to_string()),
            watched_at: item
                .watched_at
                .as_ref()
                .and_then(RawTimestamp::to_datetime)
                .map(|dt| dt.to_rfc3339()),
            country: item.country.clone(),
            genre: item.genre.clone(),
            media_kind: Some(item.media_kind.to_string()),
            status: Some(item.status.to_string()),
        };
        csv_writer.serialize(row)?;
    }
    csv_writer.flush().map_err(SourceError::from)?;
    Ok(items.len())
}

/// Create every item whose id is not in `existing`, tracking progress
pub async fn import_into_store(
    store: &dyn DocumentStore,
    user: &UserId,
    items: Vec<WatchedItem>,
    existing: &[WatchedItem],
) -> ProgressCounts {
    let mut known: HashSet<ItemId> = existing.iter().map(|i| i.id.canonical()).collect();
    let mut tracker = ProgressTracker::new(items.len(), 50);

    for (idx, item) in items.into_iter().enumerate() {
        if !known.insert(item.id.canonical()) {
            tracker.record_already_present();
        } else {
            match store.create_item(user, item).await {
                Ok(_) => tracker.record_added(),
                Err(SourceError::AlreadyExists(_)) => tracker.record_already_present(),
                Err(e) => {
                    warn!("Import failed for one item: {}", e);
                    let category = match e {
                        SourceError::Io(_) => "io",
                        SourceError::Serialization(_) => "serialization",
                        _ => "other",
                    };
                    tracker.record_failed_with_error(category);
                }
            }
        }
        tracker.log_progress(idx + 1);
    }

    tracker.finish("CSV import")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonFileStore;

    const SAMPLE: &str = "\
id,title,original_title,rating,runtime_minutes,watched_at,country,genre,media_kind,status
603,The Matrix,,5,136,1999-04-02,United States,\"Action, Science Fiction\",movie,history
,Spirited Away,千と千尋の神隠し,4,125,2024-06-01T20:00:00Z,Japan,Animation,movie,
,,,,,,,,,
x1,Severance,,,0,,United States,Drama,tv,watchlist
x2,Broken,,9,abc,someday,,,podcast,
";

    #[test]
    fn test_read_items() {
        let import = read_items(SAMPLE.as_bytes()).unwrap();
        assert_eq!(import.items.len(), 3);
        assert_eq!(import.rejected.len(), 2);
        assert_eq!(import.rejected[0].line, 4);
        assert_eq!(import.rejected[1].line, 6);

        let matrix = &import.items[0];
        assert_eq!(matrix.id, ItemId::Numeric(603));
        assert_eq!(matrix.rating, 5);
        assert_eq!(matrix.genres().collect::<Vec<_>>(), vec!["Action", "Science Fiction"]);
        assert!(matrix.watched_at_millis().is_some());

        let spirited = &import.items[1];
        assert_eq!(spirited.id, ItemId::Text("csv-3-spirited-away".to_string()));
        assert_eq!(spirited.status, WatchStatus::History);
        assert_eq!(spirited.original_title.as_deref(), Some("千と千尋の神隠し"));

        let severance = &import.items[2];
        assert_eq!(severance.media_kind, MediaKind::Tv);
        assert_eq!(severance.status, WatchStatus::Watchlist);
    }

    #[test]
    fn test_parse_watched_at_variants() {
        assert!(matches!(parse_watched_at("2024-01-05"), Some(RawTimestamp::Native(_))));
        assert!(matches!(parse_watched_at("1700000000"), Some(RawTimestamp::Seconds { .. })));
        assert!(matches!(parse_watched_at("1700000000000"), Some(RawTimestamp::Millis(_))));
        assert_eq!(parse_watched_at("soon"), None);
    }

    #[test]
    fn test_export_then_import_keeps_fields() {
        let import = read_items(SAMPLE.as_bytes()).unwrap();
        let mut buffer = Vec::new();
        assert_eq!(write_items(&mut buffer, &import.items).unwrap(), 3);

        let again = read_items(buffer.as_slice()).unwrap();
        assert!(again.rejected.is_empty());
        assert_eq!(again.items.len(), 3);
        assert_eq!(again.items[0].title, "The Matrix");
        assert_eq!(again.items[0].watched_at_millis(), import.items[0].watched_at_millis());
        assert_eq!(again.items[1].id, import.items[1].id);
    }

    #[tokio::test]
    async fn test_import_into_store_skips_known_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let user = UserId::new("alice").unwrap();
        let import = read_items(SAMPLE.as_bytes()).unwrap();

        let existing = vec![import.items[0].clone()];
        let counts = import_into_store(&store, &user, import.items.clone(), &existing).await;
        assert_eq!(counts.added, 2);
        assert_eq!(counts.already_present, 1);
        assert_eq!(counts.failed, 0);
    }

    #[tokio::test]
    async fn test_import_skips_text_form_of_numeric_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let user = UserId::new("alice").unwrap();
        let legacy = WatchedItem::new("603", "The Matrix", MediaKind::Movie);
        store.create_item(&user, legacy.clone()).await.unwrap();

        let import = read_items(SAMPLE.as_bytes()).unwrap();
        let counts = import_into_store(&store, &user, import.items, &[legacy]).await;
        assert_eq!(counts.already_present, 1);
        assert_eq!(counts.added, 2);
        let subscription = store.subscribe(&user).unwrap();
        assert_eq!(subscription.snapshot().len(), 3);
    }
}
