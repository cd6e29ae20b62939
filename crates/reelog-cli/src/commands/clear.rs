use super::context::load_config;
use super::prompts;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs;
use watch_log_config::{CredentialStore, PathManager};
use watch_log_core::TrendingCache;

pub async fn run_clear(all: bool, cache: bool, credentials: bool, data: bool, yes: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();

    if all {
        clear_cache(&path_manager, output)?;
        clear_credentials(&path_manager, output)?;
        clear_data(&path_manager, yes, output)?;
        return Ok(());
    }

    let mut cleared_anything = false;

    if cache {
        clear_cache(&path_manager, output)?;
        cleared_anything = true;
    }

    if credentials {
        clear_credentials(&path_manager, output)?;
        cleared_anything = true;
    }

    if data {
        clear_data(&path_manager, yes, output)?;
        cleared_anything = true;
    }

    if !cleared_anything {
        output.warn("No clear option specified. Use --cache, --credentials, --data, or --all");
        output.println("\nExample: reelog clear --cache");
    }

    Ok(())
}

fn clear_cache(path_manager: &PathManager, output: &Output) -> Result<()> {
    let ttl_hours = load_config(path_manager)
        .map(|config| config.picker.trending_cache_hours)
        .unwrap_or_default();
    let cache = TrendingCache::new(path_manager, ttl_hours)
        .map_err(|e| eyre!("Failed to open the trending cache: {}", e))?;
    let removed = cache
        .clear()
        .map_err(|e| eyre!("Failed to clear the trending cache: {}", e))?;

    if removed == 0 {
        output.info("No cached trending lists found to clear");
    } else {
        output.success(format!(
            "Cleared {} cached trending list(s) in {}",
            removed,
            path_manager.cache_metadata_dir().display()
        ));
    }
    Ok(())
}

fn clear_credentials(path_manager: &PathManager, output: &Output) -> Result<()> {
    let credentials_file = path_manager.credentials_file();
    if !credentials_file.exists() {
        output.info("No credentials file found to clear");
        return Ok(());
    }

    let mut store = CredentialStore::new(credentials_file.clone());
    store
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;
    let keys = store.get_all_keys();
    fs::remove_file(&credentials_file)
        .map_err(|e| eyre!("Failed to remove credentials file at {}: {}", credentials_file.display(), e))?;
    output.success(format!(
        "Cleared {} credential(s): {}",
        keys.len(),
        credentials_file.display()
    ));
    Ok(())
}

/// Delete every stored collection and album. Asks first unless `yes` is set.
fn clear_data(path_manager: &PathManager, yes: bool, output: &Output) -> Result<()> {
    let store_dir = path_manager.store_dir();
    if !store_dir.exists() {
        output.info("No collection data found to clear");
        return Ok(());
    }

    if !yes {
        if !prompts::is_interactive() {
            return Err(eyre!("Refusing to delete collection data without --yes"));
        }
        let question = format!("Delete every collection and album in {}?", store_dir.display());
        if !prompts::prompt_yes_no(&question, Some(false))? {
            output.info("Collection data kept.");
            return Ok(());
        }
    }

    fs::remove_dir_all(&store_dir)
        .map_err(|e| eyre!("Failed to remove collection data at {}: {}", store_dir.display(), e))?;
    output.success(format!("Cleared collection data: {}", store_dir.display()));
    Ok(())
}
