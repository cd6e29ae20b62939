use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use watch_log_models::{Album, Candidate, CandidateDetails, ItemId, MediaKind, WatchedItem};
use crate::error::SourceResult;
use crate::identity::UserId;

/// Immutable view of a user's collection at one point in time
pub type Snapshot = Arc<Vec<WatchedItem>>;

/// Live feed of collection snapshots.
///
/// Dropping the subscription (or calling [`Subscription::unsubscribe`]) runs
/// the store's teardown callback exactly once.
pub struct Subscription {
    receiver: watch::Receiver<Snapshot>,
    teardown: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(receiver: watch::Receiver<Snapshot>, teardown: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            receiver,
            teardown: Some(Box::new(teardown)),
        }
    }

    /// Latest snapshot pushed by the store
    pub fn snapshot(&self) -> Snapshot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next snapshot. Returns false once the store has gone away.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("items", &self.receiver.borrow().len())
            .finish()
    }
}

/// Push-based document store holding each user's collection and albums.
///
/// The store never filters or sorts; it only persists documents and pushes
/// fresh snapshots to subscribers after every write.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn store_name(&self) -> &str;

    // Live snapshot feed
    fn subscribe(&self, user: &UserId) -> SourceResult<Subscription>;

    // Item writes
    async fn create_item(&self, user: &UserId, item: WatchedItem) -> SourceResult<WatchedItem>;
    async fn update_item(&self, user: &UserId, item: WatchedItem) -> SourceResult<()>;
    async fn delete_item(&self, user: &UserId, id: &ItemId) -> SourceResult<WatchedItem>;

    // Albums
    async fn list_albums(&self, user: &UserId) -> SourceResult<Vec<Album>>;
    async fn save_album(&self, user: &UserId, album: Album) -> SourceResult<()>;
    async fn delete_album(&self, user: &UserId, album_id: &str) -> SourceResult<Album>;
}

/// Read-only catalog of titles (search, trending, details)
#[async_trait]
pub trait MetadataApi: Send + Sync {
    fn source_name(&self) -> &str;

    async fn search(&self, query: &str, kind: Option<MediaKind>) -> SourceResult<Vec<Candidate>>;
    async fn trending(&self, kind: Option<MediaKind>) -> SourceResult<Vec<Candidate>>;
    async fn details(&self, id: u64, kind: MediaKind) -> SourceResult<CandidateDetails>;

    /// Genre id → name table for the given kind
    async fn genres(&self, kind: MediaKind) -> SourceResult<HashMap<u32, String>>;
}
