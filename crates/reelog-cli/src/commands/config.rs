use super::context::load_config;
use super::prompts;
use crate::output::{styled_table, Output};
use crate::ConfigCommands;
use chrono::Utc;
use color_eyre::eyre::{bail, eyre};
use color_eyre::Result;
use comfy_table::Cell;
use owo_colors::OwoColorize;
use serde_json::json;
use tracing::info;
use watch_log_config::{is_valid_user_id, Config, CredentialStore, PathManager, TmdbConfig, UserConfig};
use watch_log_core::{SortKey, SortOrder};
use watch_log_sources::{TmdbAuth, TmdbClient};

pub async fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(full, output),
        ConfigCommands::Tmdb {
            api_key,
            read_token,
            language,
            region,
            skip_verify,
        } => configure_tmdb(api_key, read_token, language, region, skip_verify, output).await,
        ConfigCommands::User { id, display_name } => configure_user(id, display_name, output),
        ConfigCommands::Display { page_size, sort, order } => configure_display(page_size, sort, order, output),
        ConfigCommands::Picker {
            duration_ms,
            cache_hours,
            instant,
        } => configure_picker(duration_ms, cache_hours, instant, output),
    }
}

fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

fn check_mark(value: bool) -> String {
    if value {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

fn print_section_header(title: &str, output: &Output) {
    output.println("");
    output.println(format!("{}", title.bold().bright_cyan()));
    output.println(format!("{}", "─".repeat(title.chars().count()).bright_cyan()));
}

/// Load, change and save the config file, validating before anything is written
fn update_config(paths: &PathManager, change: impl FnOnce(&mut Config)) -> Result<Config> {
    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create configuration directories: {}", e))?;
    let mut config = load_config(paths)?;
    change(&mut config);
    config
        .validate()
        .map_err(|e| eyre!("Refusing to save an invalid configuration: {}", e))?;
    let config_file = paths.config_file();
    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))?;
    info!("Saved configuration to {}", config_file.display());
    Ok(config)
}

fn show_config(full: bool, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let config_file = paths.config_file();
    let config = load_config(&paths)?;
    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;

    let secret = |value: Option<&String>| match value {
        Some(v) if full => v.clone(),
        Some(v) => mask_string(v),
        None => mask_string(""),
    };

    if !output.is_human() {
        output.json(&json!({
            "config_file": config_file,
            "config_exists": config_file.exists(),
            "config": config,
            "credentials": {
                "tmdb_api_key": secret(credentials.get_tmdb_api_key()),
                "tmdb_read_token": secret(credentials.get_tmdb_read_token()),
                "tmdb_verified_at": credentials.get_tmdb_verified_at(),
            },
            "paths": {
                "store": paths.store_dir(),
                "cache": paths.cache_dir(),
                "log_file": paths.default_log_file(),
            },
        }));
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    if !config_file.exists() {
        output.warn(format!(
            "No configuration file at {}; showing defaults.",
            config_file.display()
        ));
    }

    let mut files = styled_table(["Files", ""]);
    files.add_row(vec![Cell::new("Config"), Cell::new(config_file.display())]);
    files.add_row(vec![Cell::new("Credentials"), Cell::new(paths.credentials_file().display())]);
    files.add_row(vec![Cell::new("Collection store"), Cell::new(paths.store_dir().display())]);
    files.add_row(vec![Cell::new("Cache"), Cell::new(paths.cache_dir().display())]);
    output.table(&files);

    let mut user = styled_table(["User", ""]);
    match config.user {
        Some(ref u) => {
            user.add_row(vec![Cell::new("Id"), Cell::new(&u.id)]);
            user.add_row(vec![
                Cell::new("Display name"),
                Cell::new(u.display_name.as_deref().unwrap_or("-")),
            ]);
        }
        None => {
            user.add_row(vec![Cell::new("Id"), Cell::new("<not set>".bright_black())]);
        }
    }
    output.table(&user);

    let mut tmdb = styled_table(["TMDB", ""]);
    tmdb.add_row(vec![Cell::new("Enabled"), Cell::new(check_mark(config.is_tmdb_enabled()))]);
    if let Some(ref t) = config.tmdb {
        tmdb.add_row(vec![Cell::new("API URL"), Cell::new(&t.base_url)]);
        tmdb.add_row(vec![Cell::new("Language"), Cell::new(&t.language)]);
        tmdb.add_row(vec![Cell::new("Region"), Cell::new(t.region.as_deref().unwrap_or("-"))]);
    }
    tmdb.add_row(vec![Cell::new("API key"), Cell::new(secret(credentials.get_tmdb_api_key()))]);
    tmdb.add_row(vec![
        Cell::new("Read token"),
        Cell::new(secret(credentials.get_tmdb_read_token())),
    ]);
    tmdb.add_row(vec![
        Cell::new("Verified"),
        Cell::new(
            credentials
                .get_tmdb_verified_at()
                .map_or("never".to_string(), |at| at.format("%Y-%m-%d %H:%M UTC").to_string()),
        ),
    ]);
    output.table(&tmdb);

    let mut listing = styled_table(["Display & picker", ""]);
    listing.add_row(vec![Cell::new("Page size"), Cell::new(config.display.page_size)]);
    listing.add_row(vec![
        Cell::new("Default sort"),
        Cell::new(format!("{} {}", config.display.sort, config.display.order)),
    ]);
    listing.add_row(vec![
        Cell::new("Shuffle duration"),
        Cell::new(format!("{} ms", config.picker.duration_ms)),
    ]);
    listing.add_row(vec![Cell::new("Instant picks"), Cell::new(check_mark(config.picker.instant))]);
    listing.add_row(vec![
        Cell::new("Trending cache"),
        Cell::new(format!("{} hours", config.picker.trending_cache_hours)),
    ]);
    output.table(&listing);
    Ok(())
}

async fn configure_tmdb(
    api_key_arg: Option<String>,
    read_token_arg: Option<String>,
    language: Option<String>,
    region: Option<String>,
    skip_verify: bool,
    output: &Output,
) -> Result<()> {
    let paths = PathManager::default();
    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;

    let interactive = prompts::is_interactive();
    let wizard = interactive && api_key_arg.is_none() && read_token_arg.is_none();
    let read_secret = |prompt: &str| {
        if interactive {
            prompts::prompt_password(prompt)
        } else {
            prompts::read_secret_plain(&format!("{}: ", prompt))
        }
    };

    let (api_key, read_token) = match (api_key_arg, read_token_arg) {
        (None, None) => {
            print_section_header("TMDB API Setup", output);
            output.println("Create an API key at https://www.themoviedb.org/settings/api");
            output.println("Either the v3 API key or the v4 read access token works.");
            output.println("");
            let token = read_secret("TMDB read access token (leave empty to use an API key)")?;
            if token.trim().is_empty() {
                (Some(read_secret("TMDB API key")?), None)
            } else {
                (None, Some(token))
            }
        }
        pair => pair,
    };

    let api_key = api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
    let read_token = read_token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    if api_key.is_none() && read_token.is_none() {
        bail!("No TMDB credential given");
    }

    let mut tmdb_config = load_config(&paths)?
        .tmdb
        .unwrap_or_else(TmdbConfig::enabled_default);
    tmdb_config.enabled = true;
    match language {
        Some(language) => tmdb_config.language = language,
        None if wizard => {
            tmdb_config.language = prompts::prompt_string("Language", Some(&tmdb_config.language))?;
        }
        None => {}
    }
    if region.is_some() {
        tmdb_config.region = region;
    }

    if !skip_verify {
        let auth = match (&read_token, &api_key) {
            (Some(token), _) => TmdbAuth::Bearer(token.clone()),
            (None, Some(key)) => TmdbAuth::ApiKey(key.clone()),
            (None, None) => bail!("No TMDB credential given"),
        };
        output.info("Checking the credential against TMDB...");
        TmdbClient::new(&tmdb_config, auth)
            .verify()
            .await
            .map_err(|e| eyre!("TMDB rejected the credential: {}", e))?;
        credentials.set_tmdb_verified_at(Utc::now());
    }

    if let Some(key) = api_key {
        credentials.set_tmdb_api_key(key);
    }
    if let Some(token) = read_token {
        credentials.set_tmdb_read_token(token);
    }
    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create configuration directories: {}", e))?;
    credentials
        .save()
        .map_err(|e| eyre!("Failed to save credentials: {}", e))?;

    update_config(&paths, |config| config.tmdb = Some(tmdb_config))?;
    info!(verified = !skip_verify, "Configured TMDB");
    output.success(if skip_verify {
        "TMDB configured (not verified)"
    } else {
        "TMDB configured and verified"
    });
    Ok(())
}

fn configure_user(id: String, display_name: Option<String>, output: &Output) -> Result<()> {
    let id = id.trim().to_string();
    if !is_valid_user_id(&id) {
        bail!("Invalid user id {:?}: use letters, digits, '-', '_' or '.'", id);
    }
    let paths = PathManager::default();
    update_config(&paths, |config| {
        let display_name = display_name.or_else(|| config.user.as_ref().and_then(|u| u.display_name.clone()));
        config.user = Some(UserConfig {
            id: id.clone(),
            display_name,
        });
    })?;
    output.success(format!("Collection owner set to {}", id));
    Ok(())
}

fn configure_display(
    page_size: Option<usize>,
    sort: Option<SortKey>,
    order: Option<SortOrder>,
    output: &Output,
) -> Result<()> {
    if page_size.is_none() && sort.is_none() && order.is_none() {
        bail!("Nothing to change; pass --page-size, --sort or --order");
    }
    let paths = PathManager::default();
    let config = update_config(&paths, |config| {
        if let Some(size) = page_size {
            config.display.page_size = size;
        }
        if let Some(key) = sort {
            config.display.sort = key.as_str().to_string();
        }
        if let Some(order) = order {
            config.display.order = order.as_str().to_string();
        }
    })?;
    output.success(format!(
        "Listing shows {} per page, sorted by {} {}",
        config.display.page_size, config.display.sort, config.display.order
    ));
    Ok(())
}

fn configure_picker(
    duration_ms: Option<u64>,
    cache_hours: Option<u64>,
    instant: Option<bool>,
    output: &Output,
) -> Result<()> {
    if duration_ms.is_none() && cache_hours.is_none() && instant.is_none() {
        bail!("Nothing to change; pass --duration-ms, --cache-hours or --instant");
    }
    let paths = PathManager::default();
    let config = update_config(&paths, |config| {
        if let Some(ms) = duration_ms {
            config.picker.duration_ms = ms;
        }
        if let Some(hours) = cache_hours {
            config.picker.trending_cache_hours = hours;
        }
        if let Some(instant) = instant {
            config.picker.instant = instant;
        }
    })?;
    output.success(format!(
        "Shuffle runs {} ms{}; trending lists are cached for {} hours",
        config.picker.duration_ms,
        if config.picker.instant { " (instant picks on)" } else { "" },
        config.picker.trending_cache_hours
    ));
    Ok(())
}
