use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::item_id::ItemId;

/// A user-curated list of collection items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub item_ids: Vec<ItemId>,
    pub created_at: DateTime<Utc>,
}

impl Album {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            item_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.item_ids.contains(id)
    }

    /// Add an item; returns false when it was already present
    pub fn add_item(&mut self, id: ItemId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.item_ids.push(id);
        true
    }

    /// Remove an item; returns false when it was not present
    pub fn remove_item(&mut self, id: &ItemId) -> bool {
        let before = self.item_ids.len();
        self.item_ids.retain(|existing| existing != id);
        self.item_ids.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove_are_idempotent() {
        let mut album = Album::new("fav", "Favourites");
        assert!(album.add_item(ItemId::Numeric(1)));
        assert!(!album.add_item(ItemId::Numeric(1)));
        assert_eq!(album.item_ids.len(), 1);
        assert!(album.remove_item(&ItemId::Numeric(1)));
        assert!(!album.remove_item(&ItemId::Numeric(1)));
    }
}
