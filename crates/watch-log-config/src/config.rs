use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub user: Option<UserConfig>,
    #[serde(default)]
    pub tmdb: Option<TmdbConfig>,
    #[serde(default = "default_display_config")]
    pub display: DisplayConfig,
    #[serde(default = "default_picker_config")]
    pub picker: PickerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Identity used to scope which collection is read and written
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserConfig {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TmdbConfig {
    pub enabled: bool,
    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,
    #[serde(default = "default_tmdb_image_base_url")]
    pub image_base_url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_sort")]
    pub sort: String, // date | title | runtime
    #[serde(default = "default_order")]
    pub order: String, // asc | desc
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PickerConfig {
    /// Total length of the shuffle animation
    #[serde(default = "default_shuffle_duration_ms")]
    pub duration_ms: u64,
    /// How long a fetched trending list stays usable as the fallback pool
    #[serde(default = "default_trending_cache_hours")]
    pub trending_cache_hours: u64,
    /// Skip the animation and settle immediately
    #[serde(default)]
    pub instant: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub json: Option<bool>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

pub const VALID_SORT_KEYS: [&str; 3] = ["date", "title", "runtime"];
pub const VALID_SORT_ORDERS: [&str; 2] = ["asc", "desc"];
pub const MAX_PAGE_SIZE: usize = 200;
pub const MIN_SHUFFLE_DURATION_MS: u64 = 200;

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w342".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_page_size() -> usize {
    20
}

fn default_sort() -> String {
    "date".to_string()
}

fn default_order() -> String {
    "desc".to_string()
}

fn default_shuffle_duration_ms() -> u64 {
    3000
}

fn default_trending_cache_hours() -> u64 {
    12
}

pub fn default_display_config() -> DisplayConfig {
    DisplayConfig {
        page_size: default_page_size(),
        sort: default_sort(),
        order: default_order(),
    }
}

pub fn default_picker_config() -> PickerConfig {
    PickerConfig {
        duration_ms: default_shuffle_duration_ms(),
        trending_cache_hours: default_trending_cache_hours(),
        instant: false,
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        default_display_config()
    }
}

impl Default for PickerConfig {
    fn default() -> Self {
        default_picker_config()
    }
}

impl TmdbConfig {
    pub fn enabled_default() -> Self {
        Self {
            enabled: true,
            base_url: default_tmdb_base_url(),
            image_base_url: default_tmdb_image_base_url(),
            language: default_language(),
            region: None,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file, falling back to defaults when it does not exist yet
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        Self::load_from_file(&path.to_path_buf())
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.display.page_size == 0 || self.display.page_size > MAX_PAGE_SIZE {
            return Err(anyhow::anyhow!(
                "display.page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            ));
        }

        if !VALID_SORT_KEYS.contains(&self.display.sort.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid display.sort: {} (expected one of {})",
                self.display.sort,
                VALID_SORT_KEYS.join(", ")
            ));
        }

        if !VALID_SORT_ORDERS.contains(&self.display.order.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid display.order: {} (expected asc or desc)",
                self.display.order
            ));
        }

        if self.picker.duration_ms < MIN_SHUFFLE_DURATION_MS {
            return Err(anyhow::anyhow!(
                "picker.duration_ms must be at least {}",
                MIN_SHUFFLE_DURATION_MS
            ));
        }

        if let Some(ref user) = self.user {
            if !is_valid_user_id(&user.id) {
                return Err(anyhow::anyhow!(
                    "Invalid user.id: {:?} (use letters, digits, '-', '_' or '.')",
                    user.id
                ));
            }
        }

        if let Some(ref tmdb) = self.tmdb {
            if tmdb.enabled && !tmdb.base_url.starts_with("http") {
                return Err(anyhow::anyhow!("tmdb.base_url must be an http(s) URL"));
            }
        }

        Ok(())
    }

    pub fn is_tmdb_enabled(&self) -> bool {
        self.tmdb.as_ref().is_some_and(|t| t.enabled)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }
}

/// User ids name a directory in the store, so keep them path-safe
pub fn is_valid_user_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}
