use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use watch_log_config::PathManager;
use watch_log_models::{Candidate, MediaKind};
use watch_log_sources::MetadataApi;

const MAX_TTL_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, Serialize, Deserialize)]
struct CachedList {
    fetched_at: DateTime<Utc>,
    candidates: Vec<Candidate>,
}

/// Trending lists from the metadata API, kept on disk for a while so every
/// `pick` does not cost a request
#[derive(Clone)]
pub struct TrendingCache {
    dir: PathBuf,
    ttl: Duration,
}

fn kind_label(kind: Option<MediaKind>) -> &'static str {
    kind.map_or("all", |k| k.as_str())
}

impl TrendingCache {
    pub fn new(path_manager: &PathManager, ttl_hours: u64) -> Result<Self> {
        Self::with_dir(path_manager.cache_metadata_dir(), ttl_hours)
    }

    pub fn with_dir(dir: PathBuf, ttl_hours: u64) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        // Anything beyond ten years is "forever" for a trending list
        let hours = i64::try_from(ttl_hours).unwrap_or(i64::MAX).min(MAX_TTL_HOURS);
        Ok(Self {
            dir,
            ttl: Duration::hours(hours),
        })
    }

    fn cache_path(&self, kind: Option<MediaKind>) -> PathBuf {
        self.dir.join(format!("trending_{}.json", kind_label(kind)))
    }

    pub fn load(&self, kind: Option<MediaKind>) -> Result<Option<Vec<Candidate>>> {
        self.load_at(kind, Utc::now())
    }

    /// Cached list if present and younger than the TTL as of `now`
    pub fn load_at(&self, kind: Option<MediaKind>, now: DateTime<Utc>) -> Result<Option<Vec<Candidate>>> {
        let cache_path = self.cache_path(kind);
        let label = kind_label(kind);

        if !cache_path.exists() {
            debug!("Cache miss: trending {} (file does not exist)", label);
            return Ok(None);
        }

        let content = match std::fs::read_to_string(&cache_path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read cache file for trending {}: {}", label, e);
                return Ok(None);
            }
        };

        match serde_json::from_str::<CachedList>(&content) {
            Ok(cached) => {
                if now.signed_duration_since(cached.fetched_at) >= self.ttl {
                    debug!("Cache expired: trending {} (fetched {})", label, cached.fetched_at);
                    return Ok(None);
                }
                info!("Cache hit: trending {} (loaded {} items)", label, cached.candidates.len());
                Ok(Some(cached.candidates))
            }
            Err(e) => {
                warn!(
                    "Cache corruption detected for trending {}: {}. Deleting corrupted file.",
                    label, e
                );
                if let Err(rm_err) = std::fs::remove_file(&cache_path) {
                    warn!("Failed to delete corrupted cache file: {}", rm_err);
                }
                Ok(None)
            }
        }
    }

    pub fn save(&self, kind: Option<MediaKind>, candidates: &[Candidate]) -> Result<()> {
        self.save_at(kind, candidates, Utc::now())
    }

    fn save_at(&self, kind: Option<MediaKind>, candidates: &[Candidate], fetched_at: DateTime<Utc>) -> Result<()> {
        let cache_path = self.cache_path(kind);
        let cached = CachedList {
            fetched_at,
            candidates: candidates.to_vec(),
        };
        let json = serde_json::to_string_pretty(&cached)
            .map_err(|e| anyhow!("Failed to serialize cache: {}", e))?;
        std::fs::write(&cache_path, json).map_err(|e| {
            warn!("Failed to write cache file for trending {}: {}", kind_label(kind), e);
            anyhow!("Failed to write cache: {}", e)
        })?;
        debug!("Cache saved: trending {} (saved {} items)", kind_label(kind), candidates.len());
        Ok(())
    }

    /// Cached list, or a fresh one from the API (which is then cached)
    pub async fn get_or_fetch(&self, api: &dyn MetadataApi, kind: Option<MediaKind>) -> Result<Vec<Candidate>> {
        if let Some(candidates) = self.load(kind)? {
            return Ok(candidates);
        }
        let candidates = api.trending(kind).await?;
        if let Err(e) = self.save(kind, &candidates) {
            warn!("Trending list fetched but not cached: {}", e);
        }
        Ok(candidates)
    }

    /// Remove every cached list, returning how many files were deleted
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        if !self.dir.exists() {
            return Ok(0);
        }
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_trending = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("trending_") && n.ends_with(".json"));
            if is_trending {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use watch_log_models::CandidateDetails;
    use watch_log_sources::{SourceError, SourceResult};

    fn create_cache(dir: &tempfile::TempDir) -> TrendingCache {
        TrendingCache::with_dir(dir.path().join("metadata"), 12).unwrap()
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = create_cache(&dir);
        assert!(cache.load(None).unwrap().is_none());

        cache.save(None, &[Candidate::new(1, "Dune")]).unwrap();
        let loaded = cache.load(None).unwrap().unwrap();
        assert_eq!(loaded[0].title, "Dune");
        assert!(cache.load(Some(MediaKind::Tv)).unwrap().is_none());
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = create_cache(&dir);
        let fetched = Utc::now() - Duration::hours(13);
        cache.save_at(Some(MediaKind::Movie), &[Candidate::new(1, "Old")], fetched).unwrap();
        assert!(cache.load(Some(MediaKind::Movie)).unwrap().is_none());
        assert!(cache
            .load_at(Some(MediaKind::Movie), fetched + Duration::hours(1))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_corrupt_file_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let cache = create_cache(&dir);
        let path = cache.cache_path(None);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(cache.load(None).unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_clear_removes_only_trending_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = create_cache(&dir);
        cache.save(None, &[]).unwrap();
        cache.save(Some(MediaKind::Tv), &[]).unwrap();
        std::fs::write(dir.path().join("metadata").join("other.json"), "[]").unwrap();
        assert_eq!(cache.clear().unwrap(), 2);
        assert!(dir.path().join("metadata").join("other.json").exists());
    }

    struct CountingApi {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetadataApi for CountingApi {
        fn source_name(&self) -> &str {
            "counting"
        }

        async fn search(&self, _query: &str, _kind: Option<MediaKind>) -> SourceResult<Vec<Candidate>> {
            Ok(Vec::new())
        }

        async fn trending(&self, _kind: Option<MediaKind>) -> SourceResult<Vec<Candidate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Candidate::new(7, "Fresh")])
        }

        async fn details(&self, id: u64, _kind: MediaKind) -> SourceResult<CandidateDetails> {
            Err(SourceError::NotFound(id.to_string()))
        }

        async fn genres(&self, _kind: MediaKind) -> SourceResult<HashMap<u32, String>> {
            Ok(HashMap::new())
        }
    }

    #[tokio::test]
    async fn test_get_or_fetch_uses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = create_cache(&dir);
        let api = CountingApi {
            calls: AtomicUsize::new(0),
        };
        assert_eq!(cache.get_or_fetch(&api, None).await.unwrap().len(), 1);
        assert_eq!(cache.get_or_fetch(&api, None).await.unwrap().len(), 1);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }
}
