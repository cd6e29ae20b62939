use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A watch timestamp as it arrives from the document store.
///
/// Documents written by different clients over the years carry the same
/// instant in several shapes. Everything downstream works on epoch
/// milliseconds obtained through [`RawTimestamp::epoch_millis`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// RFC 3339 date string
    Native(DateTime<Utc>),
    /// Store timestamp wrapper (`{seconds, nanoseconds}`)
    Store {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(alias = "_nanoseconds")]
        nanoseconds: u32,
    },
    /// Bare epoch-seconds object
    Seconds {
        #[serde(alias = "_seconds")]
        seconds: i64,
    },
    /// Epoch milliseconds
    Millis(i64),
    /// Any other shape; never matches a date predicate
    Unrecognized(serde_json::Value),
}

impl RawTimestamp {
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        RawTimestamp::Native(dt)
    }

    /// Normalize to epoch milliseconds. `None` for unrecognized shapes or
    /// values that overflow.
    pub fn epoch_millis(&self) -> Option<i64> {
        match self {
            RawTimestamp::Native(dt) => Some(dt.timestamp_millis()),
            RawTimestamp::Store { seconds, nanoseconds } => seconds
                .checked_mul(1000)
                .and_then(|ms| ms.checked_add(i64::from(*nanoseconds) / 1_000_000)),
            RawTimestamp::Seconds { seconds } => seconds.checked_mul(1000),
            RawTimestamp::Millis(ms) => Some(*ms),
            RawTimestamp::Unrecognized(_) => None,
        }
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        self.epoch_millis().and_then(DateTime::from_timestamp_millis)
    }

    /// Calendar year of the instant in the given time zone
    pub fn year_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<i32> {
        self.to_datetime().map(|dt| dt.with_timezone(tz).year())
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        RawTimestamp::Native(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(json: &str) -> RawTimestamp {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_native_date_string() {
        let ts = parse(r#""2024-06-01T12:00:00Z""#);
        let expected = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(ts, RawTimestamp::Native(expected));
        assert_eq!(ts.epoch_millis(), Some(expected.timestamp_millis()));
    }

    #[test]
    fn test_store_wrapper_uses_nanoseconds() {
        let ts = parse(r#"{"seconds": 1700000000, "nanoseconds": 250000000}"#);
        assert_eq!(ts.epoch_millis(), Some(1_700_000_000_250));

        let underscored = parse(r#"{"_seconds": 1700000000, "_nanoseconds": 0}"#);
        assert_eq!(underscored.epoch_millis(), Some(1_700_000_000_000));
    }

    #[test]
    fn test_seconds_object() {
        let ts = parse(r#"{"seconds": 1700000000}"#);
        assert!(matches!(ts, RawTimestamp::Seconds { .. }));
        assert_eq!(ts.epoch_millis(), Some(1_700_000_000_000));
    }

    #[test]
    fn test_millis_number() {
        assert_eq!(parse("1700000000000").epoch_millis(), Some(1_700_000_000_000));
    }

    #[test]
    fn test_unrecognized_shapes_normalize_to_none() {
        assert_eq!(parse(r#""last tuesday""#).epoch_millis(), None);
        assert_eq!(parse(r#"{"when": 5}"#).epoch_millis(), None);
        assert_eq!(parse("true").epoch_millis(), None);
    }

    #[test]
    fn test_overflow_is_none() {
        let ts = RawTimestamp::Seconds { seconds: i64::MAX };
        assert_eq!(ts.epoch_millis(), None);
    }

    #[test]
    fn test_year_in_timezone() {
        // 2023-12-31T23:30:00Z is already 2024 east of UTC
        let ts = RawTimestamp::from_datetime(Utc.with_ymd_and_hms(2023, 12, 31, 23, 30, 0).unwrap());
        assert_eq!(ts.year_in(&Utc), Some(2023));
        let plus_two = chrono::FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(ts.year_in(&plus_two), Some(2024));
    }
}
