use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use std::sync::Arc;
use tracing::debug;
use watch_log_config::{Config, CredentialStore, PathManager};
use watch_log_core::{ShuffleSchedule, TrendingCache};
use watch_log_sources::{Backends, DocumentStore, IdentityProvider, MetadataApi, Snapshot, UserId};

/// Everything a command needs, loaded once per invocation
pub struct AppContext {
    pub paths: PathManager,
    pub config: Config,
    pub credentials: CredentialStore,
    backends: Backends,
}

pub fn load_config(paths: &PathManager) -> Result<Config> {
    let config_file = paths.config_file();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config
        .validate()
        .map_err(|e| eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;
    Ok(config)
}

pub fn load_credentials(paths: &PathManager) -> Result<CredentialStore> {
    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;
    Ok(credentials)
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let paths = PathManager::default();
        let config = load_config(&paths)?;
        let credentials = load_credentials(&paths)?;
        let backends = Backends::from_config(&config, &credentials, &paths)
            .map_err(|e| eyre!("Failed to open the collection store: {}", e))?;
        Ok(Self {
            paths,
            config,
            credentials,
            backends,
        })
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.backends.store.as_ref()
    }

    /// Current user, or an error explaining how to set one
    pub fn user(&self) -> Result<UserId> {
        self.backends.identity.current_user().ok_or_else(|| {
            eyre!("No user configured. Run `reelog config user <id>` or set REELOG_USER.")
        })
    }

    pub fn metadata(&self) -> Result<Arc<dyn MetadataApi>> {
        self.backends
            .metadata
            .clone()
            .map_err(|reason| eyre!("{}", reason))
    }

    pub fn metadata_available(&self) -> bool {
        self.backends.metadata.is_ok()
    }

    /// One-shot read of the live collection snapshot
    pub fn snapshot(&self, user: &UserId) -> Result<Snapshot> {
        let subscription = self
            .store()
            .subscribe(user)
            .wrap_err("Failed to read the collection")?;
        let snapshot = subscription.snapshot();
        subscription.unsubscribe();
        debug!(user = %user, items = snapshot.len(), "Loaded collection snapshot");
        Ok(snapshot)
    }

    pub fn trending_cache(&self) -> Result<TrendingCache> {
        TrendingCache::new(&self.paths, self.config.picker.trending_cache_hours)
            .map_err(|e| eyre!("Failed to open the trending cache: {}", e))
    }

    pub fn shuffle_schedule(&self, instant: bool) -> ShuffleSchedule {
        if instant || self.config.picker.instant {
            ShuffleSchedule::instant()
        } else {
            ShuffleSchedule::with_total(std::time::Duration::from_millis(self.config.picker.duration_ms))
        }
    }
}
