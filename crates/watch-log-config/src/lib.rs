pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{Config, DisplayConfig, LoggingConfig, PickerConfig, TmdbConfig, UserConfig, default_display_config, default_picker_config, is_valid_user_id};
pub use credentials::CredentialStore;
pub use paths::{PathManager, container_base_path};
