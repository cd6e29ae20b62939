use super::context::AppContext;
use super::prompts;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use rand::rngs::StdRng;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};
use watch_log_core::picker::{Picker, PickerEvent};
use watch_log_core::shuffle::SharedPicker;
use watch_log_core::{watchlist_pool, MonotonicClock, PoolEntry, PoolKind, ShuffleDriver};
use watch_log_models::MediaKind;

type Pool = SharedPicker<PoolEntry, MonotonicClock, StdRng>;

fn spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.magenta} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Show the highlight moving until the picker settles; returns false if the shuffle was cut short
async fn animate(mut events: mpsc::UnboundedReceiver<PickerEvent>, picker: &Pool, output: &Output) -> bool {
    let bar = output.is_human().then(spinner);
    let mut settled = false;

    while let Some(event) = events.recv().await {
        match event {
            PickerEvent::Advanced(index) => {
                if let Some(ref bar) = bar {
                    let picker = picker.lock().await;
                    if let Some(entry) = picker.pool().get(index) {
                        bar.set_message(entry.title().to_string());
                    }
                }
            }
            PickerEvent::Settled(index) => {
                debug!(index, "Shuffle settled");
                settled = true;
            }
            PickerEvent::Idle | PickerEvent::Waiting => {}
        }
    }

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    settled
}

fn show_pick(entry: &PoolEntry, pool_kind: PoolKind, pool_size: usize, output: &Output) {
    if !output.is_human() {
        output.json(&json!({
            "pool": pool_kind,
            "pool_size": pool_size,
            "pick": entry,
        }));
        return;
    }

    let kind = entry.media_kind().map_or(String::new(), |k| format!(" ({})", k));
    output.println(format!("\n🎬 {}{}", entry.title().bold().bright_cyan(), kind));
    match entry {
        PoolEntry::Watchlist(item) => {
            if let Some(ref genre) = item.genre {
                output.println(format!("   {}", genre.bright_black()));
            }
        }
        PoolEntry::Trending(candidate) => {
            if let Some(ref overview) = candidate.overview {
                output.println(format!("   {}", overview.bright_black()));
            }
        }
    }
    let source = match pool_kind {
        PoolKind::Watchlist => "your watchlist",
        PoolKind::Trending => "trending titles",
    };
    output.println(format!(
        "{}",
        format!("   picked from {} entries in {}", pool_size, source).bright_black()
    ));
}

pub async fn run_pick(
    kind: Option<MediaKind>,
    trending: bool,
    instant: bool,
    no_prompt: bool,
    output: &Output,
) -> Result<()> {
    let ctx = AppContext::load()?;
    let user = ctx.user()?;
    let snapshot = ctx.snapshot(&user)?;

    let mut pool: Vec<PoolEntry> = watchlist_pool(&snapshot)
        .into_iter()
        .filter(|entry| kind.is_none() || entry.media_kind() == kind)
        .collect();
    let mut pool_kind = PoolKind::Watchlist;

    if trending || pool.is_empty() {
        if !trending {
            output.info("Your watchlist is empty, picking from trending titles instead.");
        }
        let api = ctx.metadata()?;
        let candidates = ctx
            .trending_cache()?
            .get_or_fetch(api.as_ref(), kind)
            .await
            .map_err(|e| eyre!("Failed to load trending titles: {}", e))?;
        pool = candidates.into_iter().map(PoolEntry::Trending).collect();
        pool_kind = PoolKind::Trending;
    }

    if pool.is_empty() {
        output.warn("Nothing to pick from.");
        return Ok(());
    }

    let pool_size = pool.len();
    let schedule = ctx.shuffle_schedule(instant || !output.is_human());
    let mut driver = ShuffleDriver::new(Picker::with_schedule(schedule));
    let picker = driver.picker();
    let mut pending = driver.set_pool(pool_kind, pool).await;

    loop {
        let events = match pending.take() {
            Some(events) => events,
            None => driver.spawn_shuffle().await,
        };
        if !animate(events, &picker, output).await {
            output.warn("The pick was interrupted.");
            return Ok(());
        }

        let selected = picker.lock().await.selected().cloned();
        let Some(entry) = selected else {
            output.warn("Nothing to pick from.");
            return Ok(());
        };
        info!(operation = "pick", pool = %pool_kind, title = entry.title(), "Picked a title");
        show_pick(&entry, pool_kind, pool_size, output);

        if no_prompt || !output.is_human() || !prompts::is_interactive() {
            break;
        }
        if !prompts::prompt_yes_no("Spin again?", Some(false))? {
            break;
        }
    }

    picker.lock().await.clear();
    Ok(())
}
