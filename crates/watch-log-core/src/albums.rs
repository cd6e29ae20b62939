// Album views over a collection snapshot

use std::collections::HashMap;
use tracing::debug;
use watch_log_models::{Album, ItemId, WatchedItem};

/// Ids that name the same item (`603` and `"603"` match)
pub fn same_item(a: &ItemId, b: &ItemId) -> bool {
    a.same_as(b)
}

/// Items of an album in album order; ids with no item in the snapshot are skipped
pub fn album_items(album: &Album, items: &[WatchedItem]) -> Vec<WatchedItem> {
    let by_id: HashMap<&ItemId, &WatchedItem> = items.iter().map(|i| (&i.id, i)).collect();
    let mut resolved = Vec::with_capacity(album.item_ids.len());
    let mut dangling = 0;

    for id in &album.item_ids {
        let found = by_id
            .get(id)
            .copied()
            .or_else(|| items.iter().find(|item| same_item(&item.id, id)));
        match found {
            Some(item) => resolved.push(item.clone()),
            None => dangling += 1,
        }
    }

    if dangling > 0 {
        debug!(album = %album.name, dangling, "Album references items no longer in the collection");
    }
    resolved
}

/// Albums holding the item, in album order
pub fn albums_containing<'a>(albums: &'a [Album], id: &ItemId) -> Vec<&'a Album> {
    albums
        .iter()
        .filter(|album| album.item_ids.iter().any(|member| same_item(member, id)))
        .collect()
}

/// Find an album by id or case-insensitive name
pub fn find_album<'a>(albums: &'a [Album], key: &str) -> Option<&'a Album> {
    albums
        .iter()
        .find(|album| album.id == key)
        .or_else(|| albums.iter().find(|album| album.name.eq_ignore_ascii_case(key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use watch_log_models::MediaKind;

    fn items() -> Vec<WatchedItem> {
        vec![
            WatchedItem::new(ItemId::Numeric(603), "The Matrix", MediaKind::Movie),
            WatchedItem::new("custom-1", "Home Video", MediaKind::Movie),
            WatchedItem::new(ItemId::Numeric(1399), "Game of Thrones", MediaKind::Tv),
        ]
    }

    #[test]
    fn test_album_items_in_album_order() {
        let mut album = Album::new("fav", "Favourites");
        album.add_item(ItemId::Numeric(1399));
        album.add_item(ItemId::Text("gone".to_string()));
        album.add_item(ItemId::Text("603".to_string()));

        let resolved = album_items(&album, &items());
        let titles: Vec<&str> = resolved.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Game of Thrones", "The Matrix"]);
    }

    #[test]
    fn test_albums_containing() {
        let mut a = Album::new("a", "Sci-Fi");
        a.add_item(ItemId::Numeric(603));
        let mut b = Album::new("b", "Rewatch");
        b.add_item(ItemId::Text("custom-1".to_string()));
        let albums = vec![a, b];

        let found = albums_containing(&albums, &ItemId::Text("603".to_string()));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Sci-Fi");
        assert!(albums_containing(&albums, &ItemId::Numeric(1)).is_empty());
    }

    #[test]
    fn test_find_album() {
        let albums = vec![Album::new("a1", "Rewatch")];
        assert!(find_album(&albums, "a1").is_some());
        assert!(find_album(&albums, "REWATCH").is_some());
        assert!(find_album(&albums, "missing").is_none());
    }
}
