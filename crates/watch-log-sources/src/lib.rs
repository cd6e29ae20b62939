pub mod error;
pub mod identity;
pub mod traits;
pub mod store;
pub mod tmdb;
pub mod transfer;
pub mod progress;
pub mod factory;

pub use error::{SourceError, SourceResult};
pub use identity::{ConfiguredIdentity, IdentityProvider, UserId, USER_ENV_VAR};
pub use traits::{DocumentStore, MetadataApi, Snapshot, Subscription};
pub use store::JsonFileStore;
pub use tmdb::{TmdbAuth, TmdbClient};
pub use progress::{ProgressCounts, ProgressTracker};
pub use factory::{create_metadata_api, Backends, MetadataUnavailable};
