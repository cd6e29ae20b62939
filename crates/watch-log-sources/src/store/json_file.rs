use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use watch_log_models::{Album, ItemId, WatchedItem};
use crate::error::{SourceError, SourceResult};
use crate::identity::UserId;
use crate::traits::{DocumentStore, Snapshot, Subscription};

const COLLECTION_FILE: &str = "collection.json";
const ALBUMS_FILE: &str = "albums.json";

struct UserChannel {
    sender: watch::Sender<Snapshot>,
    subscribers: usize,
}

type Channels = Arc<Mutex<HashMap<UserId, UserChannel>>>;

/// Document store keeping one JSON array per user on disk.
///
/// Documents are kept as raw JSON so a record this version cannot parse
/// survives rewrites untouched; only parseable items reach snapshots.
pub struct JsonFileStore {
    root: PathBuf,
    channels: Channels,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            channels: Arc::new(Mutex::new(HashMap::new())),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn user_dir(&self, user: &UserId) -> PathBuf {
        self.root.join(user.as_str())
    }

    fn collection_path(&self, user: &UserId) -> PathBuf {
        self.user_dir(user).join(COLLECTION_FILE)
    }

    fn albums_path(&self, user: &UserId) -> PathBuf {
        self.user_dir(user).join(ALBUMS_FILE)
    }

    /// Number of live subscriptions for a user (0 once all are torn down)
    pub fn subscriber_count(&self, user: &UserId) -> usize {
        self.channels
            .lock()
            .map(|channels| channels.get(user).map(|c| c.subscribers).unwrap_or(0))
            .unwrap_or(0)
    }

    fn load_documents_blocking(path: &Path) -> SourceResult<Vec<Value>> {
        if !path.exists() {
            debug!("Store miss: {} (file does not exist)", path.display());
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    async fn load_documents(path: &Path) -> SourceResult<Vec<Value>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_documents<T: Serialize>(path: &Path, documents: &[T]) -> SourceResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(documents)?;
        // Write then rename so readers never see a half-written file
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!("Store saved: {} ({} documents)", path.display(), documents.len());
        Ok(())
    }

    /// Parse every document that is a valid item, skipping the rest
    fn parse_items(documents: &[Value]) -> Vec<WatchedItem> {
        documents
            .iter()
            .filter_map(|doc| match serde_json::from_value::<WatchedItem>(doc.clone()) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Skipping malformed collection document: {}", e);
                    None
                }
            })
            .collect()
    }

    fn document_id(doc: &Value) -> Option<ItemId> {
        doc.get("id").and_then(|id| serde_json::from_value(id.clone()).ok())
    }

    fn position_of(documents: &[Value], id: &ItemId) -> Option<usize> {
        documents
            .iter()
            .position(|doc| Self::document_id(doc).is_some_and(|doc_id| doc_id.same_as(id)))
    }

    /// Overwrite the model's fields in a stored document. Keys the model does
    /// not know are kept; known keys missing from `update` (cleared options) are removed.
    fn merge_document(stored: &mut Value, update: Value) {
        match (stored.as_object_mut(), update) {
            (Some(fields), Value::Object(new_fields)) => {
                fields.retain(|key, _| !WatchedItem::FIELDS.contains(&key.as_str()));
                fields.extend(new_fields);
            }
            (_, update) => *stored = update,
        }
    }

    /// Push a fresh snapshot to subscribers of this user, if any
    fn publish(&self, user: &UserId, documents: &[Value]) {
        let items = Self::parse_items(documents);
        match self.channels.lock() {
            Ok(channels) => {
                if let Some(channel) = channels.get(user) {
                    debug!(user = %user, items = items.len(), "Publishing collection snapshot");
                    channel.sender.send_replace(Arc::new(items));
                }
            }
            Err(e) => warn!("Subscriber registry poisoned, snapshot not published: {}", e),
        }
    }

    async fn modify_collection<R>(
        &self,
        user: &UserId,
        change: impl FnOnce(&mut Vec<Value>) -> SourceResult<R>,
    ) -> SourceResult<R> {
        let _guard = self.write_lock.lock().await;
        let path = self.collection_path(user);
        let mut documents = Self::load_documents(&path).await?;
        let result = change(&mut documents)?;
        Self::write_documents(&path, &documents).await?;
        self.publish(user, &documents);
        Ok(result)
    }

    async fn load_typed<T: DeserializeOwned>(path: &Path) -> SourceResult<Vec<T>> {
        let documents = Self::load_documents(path).await?;
        documents
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(SourceError::from))
            .collect()
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    fn store_name(&self) -> &str {
        "json-file"
    }

    fn subscribe(&self, user: &UserId) -> SourceResult<Subscription> {
        let mut channels = self
            .channels
            .lock()
            .map_err(|e| SourceError::new(format!("Subscriber registry poisoned: {}", e)))?;

        let receiver = match channels.get_mut(user) {
            Some(channel) => {
                channel.subscribers += 1;
                channel.sender.subscribe()
            }
            None => {
                let documents = Self::load_documents_blocking(&self.collection_path(user))?;
                let items = Self::parse_items(&documents);
                info!(user = %user, items = items.len(), "Loaded collection");
                let (sender, receiver) = watch::channel::<Snapshot>(Arc::new(items));
                channels.insert(user.clone(), UserChannel { sender, subscribers: 1 });
                receiver
            }
        };

        let registry = self.channels.clone();
        let user = user.clone();
        Ok(Subscription::new(receiver, move || {
            if let Ok(mut channels) = registry.lock() {
                let remove = match channels.get_mut(&user) {
                    Some(channel) => {
                        channel.subscribers = channel.subscribers.saturating_sub(1);
                        channel.subscribers == 0
                    }
                    None => false,
                };
                if remove {
                    channels.remove(&user);
                    debug!(user = %user, "Last subscriber gone, channel closed");
                }
            }
        }))
    }

    async fn create_item(&self, user: &UserId, mut item: WatchedItem) -> SourceResult<WatchedItem> {
        if item.added_at.is_none() {
            item.added_at = Some(Utc::now());
        }
        let document = serde_json::to_value(&item)?;
        self.modify_collection(user, |documents| {
            if Self::position_of(documents, &item.id).is_some() {
                return Err(SourceError::AlreadyExists(format!("item {}", item.id)));
            }
            documents.push(document);
            Ok(())
        })
        .await?;
        info!(user = %user, id = %item.id, "Created item \"{}\"", item.title);
        Ok(item)
    }

    async fn update_item(&self, user: &UserId, item: WatchedItem) -> SourceResult<()> {
        let document = serde_json::to_value(&item)?;
        self.modify_collection(user, |documents| {
            let idx = Self::position_of(documents, &item.id)
                .ok_or_else(|| SourceError::NotFound(format!("item {}", item.id)))?;
            Self::merge_document(&mut documents[idx], document);
            Ok(())
        })
        .await?;
        debug!(user = %user, id = %item.id, "Updated item");
        Ok(())
    }

    async fn delete_item(&self, user: &UserId, id: &ItemId) -> SourceResult<WatchedItem> {
        let removed = self
            .modify_collection(user, |documents| {
                let idx = Self::position_of(documents, id)
                    .ok_or_else(|| SourceError::NotFound(format!("item {}", id)))?;
                Ok(documents.remove(idx))
            })
            .await?;
        info!(user = %user, id = %id, "Deleted item");
        Ok(serde_json::from_value(removed)?)
    }

    async fn list_albums(&self, user: &UserId) -> SourceResult<Vec<Album>> {
        Self::load_typed(&self.albums_path(user)).await
    }

    async fn save_album(&self, user: &UserId, album: Album) -> SourceResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.albums_path(user);
        let mut albums: Vec<Album> = Self::load_typed(&path).await?;
        match albums.iter_mut().find(|a| a.id == album.id) {
            Some(existing) => *existing = album,
            None => albums.push(album),
        }
        Self::write_documents(&path, &albums).await
    }

    async fn delete_album(&self, user: &UserId, album_id: &str) -> SourceResult<Album> {
        let _guard = self.write_lock.lock().await;
        let path = self.albums_path(user);
        let mut albums: Vec<Album> = Self::load_typed(&path).await?;
        let idx = albums
            .iter()
            .position(|a| a.id == album_id)
            .ok_or_else(|| SourceError::NotFound(format!("album {}", album_id)))?;
        let removed = albums.remove(idx);
        Self::write_documents(&path, &albums).await?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watch_log_models::MediaKind;

    fn alice() -> UserId {
        UserId::new("alice").unwrap()
    }

    #[tokio::test]
    async fn test_subscribe_to_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let subscription = store.subscribe(&alice()).unwrap();
        assert!(subscription.snapshot().is_empty());
        assert_eq!(store.subscriber_count(&alice()), 1);
    }

    #[tokio::test]
    async fn test_writes_push_new_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let mut subscription = store.subscribe(&alice()).unwrap();

        let created = store
            .create_item(&alice(), WatchedItem::new(603u64, "The Matrix", MediaKind::Movie))
            .await
            .unwrap();
        assert!(created.added_at.is_some());
        assert!(subscription.changed().await);
        assert_eq!(subscription.snapshot().len(), 1);

        let mut rated = created.clone();
        rated.rating = 5;
        store.update_item(&alice(), rated).await.unwrap();
        assert!(subscription.changed().await);
        assert_eq!(subscription.snapshot()[0].rating, 5);

        store.delete_item(&alice(), &ItemId::Numeric(603)).await.unwrap();
        assert!(subscription.changed().await);
        assert!(subscription.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_and_missing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let item = WatchedItem::new("a", "A", MediaKind::Movie);
        store.create_item(&alice(), item.clone()).await.unwrap();

        let duplicate = store.create_item(&alice(), item.clone()).await;
        assert!(matches!(duplicate, Err(SourceError::AlreadyExists(_))));

        let missing = store.delete_item(&alice(), &ItemId::from("zzz")).await;
        assert!(missing.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_numeric_and_text_ids_are_one_item() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store
            .create_item(&alice(), WatchedItem::new("603", "The Matrix", MediaKind::Movie))
            .await
            .unwrap();

        let duplicate = store
            .create_item(&alice(), WatchedItem::new(603u64, "The Matrix", MediaKind::Movie))
            .await;
        assert!(matches!(duplicate, Err(SourceError::AlreadyExists(_))));

        let mut rated = WatchedItem::new(603u64, "The Matrix", MediaKind::Movie);
        rated.rating = 4;
        store.update_item(&alice(), rated).await.unwrap();
        let subscription = store.subscribe(&alice()).unwrap();
        assert_eq!(subscription.snapshot().len(), 1);
        assert_eq!(subscription.snapshot()[0].rating, 4);

        store.delete_item(&alice(), &ItemId::Numeric(603)).await.unwrap();
        assert!(subscription.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let user_dir = dir.path().join("alice");
        std::fs::create_dir_all(&user_dir).unwrap();
        std::fs::write(
            user_dir.join(COLLECTION_FILE),
            r#"[{"id": 7, "title": "Heat", "media_kind": "movie", "notes": "old", "rewatch_count": 3}]"#,
        )
        .unwrap();

        let store = JsonFileStore::new(dir.path());
        let mut item = WatchedItem::new(7u64, "Heat", MediaKind::Movie);
        item.rating = 5;
        store.update_item(&alice(), item).await.unwrap();

        let raw = std::fs::read_to_string(user_dir.join(COLLECTION_FILE)).unwrap();
        let documents: Vec<Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(documents[0]["rewatch_count"], 3);
        assert_eq!(documents[0]["rating"], 5);
        assert!(documents[0].get("notes").is_none());
    }

    #[tokio::test]
    async fn test_malformed_documents_are_skipped_but_kept() {
        let dir = tempfile::tempdir().unwrap();
        let user_dir = dir.path().join("alice");
        std::fs::create_dir_all(&user_dir).unwrap();
        std::fs::write(
            user_dir.join(COLLECTION_FILE),
            r#"[{"id": 1, "title": "Ok", "media_kind": "movie"}, {"id": 2, "title": 17}]"#,
        )
        .unwrap();

        let store = JsonFileStore::new(dir.path());
        let subscription = store.subscribe(&alice()).unwrap();
        assert_eq!(subscription.snapshot().len(), 1);

        store
            .create_item(&alice(), WatchedItem::new(3u64, "New", MediaKind::Tv))
            .await
            .unwrap();
        let raw = std::fs::read_to_string(user_dir.join(COLLECTION_FILE)).unwrap();
        let documents: Vec<Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(documents.len(), 3);
    }

    #[tokio::test]
    async fn test_teardown_closes_channel() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let first = store.subscribe(&alice()).unwrap();
        let second = store.subscribe(&alice()).unwrap();
        assert_eq!(store.subscriber_count(&alice()), 2);
        first.unsubscribe();
        assert_eq!(store.subscriber_count(&alice()), 1);
        drop(second);
        assert_eq!(store.subscriber_count(&alice()), 0);
    }

    #[tokio::test]
    async fn test_albums_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let mut album = Album::new("noir", "Noir");
        album.add_item(ItemId::Numeric(1));
        store.save_album(&alice(), album.clone()).await.unwrap();

        album.name = "Film Noir".to_string();
        store.save_album(&alice(), album).await.unwrap();

        let albums = store.list_albums(&alice()).await.unwrap();
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].name, "Film Noir");

        let removed = store.delete_album(&alice(), "noir").await.unwrap();
        assert_eq!(removed.item_ids, vec![ItemId::Numeric(1)]);
        assert!(store.list_albums(&alice()).await.unwrap().is_empty());
    }
}
