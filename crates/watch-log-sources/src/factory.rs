//! Builds the store, metadata API and identity from configuration.
//!
//! The CLI asks the factory once per invocation; everything else receives
//! trait objects and never touches config or credentials directly.

use anyhow::Result;
use std::sync::Arc;
use tracing::debug;
use watch_log_config::{Config, CredentialStore, PathManager};
use crate::identity::{ConfiguredIdentity, IdentityProvider};
use crate::store::JsonFileStore;
use crate::tmdb::{TmdbAuth, TmdbClient};
use crate::traits::{DocumentStore, MetadataApi};

/// Why no metadata API is available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataUnavailable {
    /// `[tmdb]` missing or `enabled = false`
    Disabled,
    /// Enabled but neither an API key nor a read token is stored
    MissingCredentials,
}

impl std::fmt::Display for MetadataUnavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataUnavailable::Disabled => {
                write!(f, "TMDB is disabled. Run `reelog config tmdb` to enable it.")
            }
            MetadataUnavailable::MissingCredentials => {
                write!(f, "No TMDB credentials stored. Run `reelog config tmdb` to add an API key.")
            }
        }
    }
}

/// Create the metadata API, or say why it cannot be created
pub fn create_metadata_api(
    config: &Config,
    credentials: &CredentialStore,
) -> Result<Arc<dyn MetadataApi>, MetadataUnavailable> {
    let tmdb = match config.tmdb.as_ref() {
        Some(tmdb) if tmdb.enabled => tmdb,
        _ => return Err(MetadataUnavailable::Disabled),
    };
    let auth = TmdbAuth::from_credentials(credentials).ok_or(MetadataUnavailable::MissingCredentials)?;
    debug!("Creating TMDB client for {}", tmdb.base_url);
    Ok(Arc::new(TmdbClient::new(tmdb, auth)))
}

/// Everything a command needs to reach the outside world
pub struct Backends {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub metadata: Result<Arc<dyn MetadataApi>, MetadataUnavailable>,
}

impl Backends {
    pub fn from_config(config: &Config, credentials: &CredentialStore, paths: &PathManager) -> Result<Self> {
        let store_dir = paths.store_dir();
        std::fs::create_dir_all(&store_dir)?;
        debug!("Using JSON document store at {}", store_dir.display());

        Ok(Self {
            store: Arc::new(JsonFileStore::new(store_dir)),
            identity: Arc::new(ConfiguredIdentity::from_config(config)),
            metadata: create_metadata_api(config, credentials),
        })
    }
}
