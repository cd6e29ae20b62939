use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a collection item.
///
/// Items created from the metadata API keep the external numeric id, items
/// created by hand (or imported) get a generated string id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(untagged)]
pub enum ItemId {
    Numeric(u64),
    Text(String),
}

impl ItemId {
    /// Numeric form of the id, if it has one (text ids holding digits count too)
    pub fn as_number(&self) -> Option<u64> {
        match self {
            ItemId::Numeric(n) => Some(*n),
            ItemId::Text(s) => s.parse().ok(),
        }
    }

    /// Form used to compare ids. Documents written by older clients store
    /// numeric ids as strings, so `"603"` and `603` share one canonical id.
    pub fn canonical(&self) -> ItemId {
        match self.as_number() {
            Some(n) => ItemId::Numeric(n),
            None => self.clone(),
        }
    }

    /// Whether both ids name the same item
    pub fn same_as(&self, other: &ItemId) -> bool {
        self == other || self.canonical() == other.canonical()
    }

    /// Parse user input, preferring the numeric form
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed.parse::<u64>() {
            Ok(n) => ItemId::Numeric(n),
            Err(_) => ItemId::Text(trimmed.to_string()),
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Numeric(n) => write!(f, "{}", n),
            ItemId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for ItemId {
    fn from(n: u64) -> Self {
        ItemId::Numeric(n)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId::Text(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_round_trip_keeps_kind() {
        let ids: Vec<ItemId> = serde_json::from_str(r#"[603, "abc-1"]"#).unwrap();
        assert_eq!(ids[0], ItemId::Numeric(603));
        assert_eq!(ids[1], ItemId::Text("abc-1".to_string()));
    }

    #[test]
    fn test_parse_prefers_numeric() {
        assert_eq!(ItemId::parse(" 42 "), ItemId::Numeric(42));
        assert_eq!(ItemId::parse("x42"), ItemId::Text("x42".to_string()));
        assert_eq!(ItemId::Text("17".to_string()).as_number(), Some(17));
    }

    #[test]
    fn test_numeric_text_is_the_same_item() {
        let text = ItemId::from("603");
        assert!(text.same_as(&ItemId::Numeric(603)));
        assert_eq!(text.canonical(), ItemId::Numeric(603));
        assert!(!text.same_as(&ItemId::Numeric(604)));
        assert!(ItemId::from("abc").same_as(&ItemId::from("abc")));
        assert_eq!(ItemId::from("abc").canonical(), ItemId::from("abc"));
    }
}
