use super::context::AppContext;
use super::display::item_table;
use super::prompts;
use crate::output::Output;
use chrono::Utc;
use clap::Args;
use color_eyre::eyre::{bail, eyre, WrapErr};
use color_eyre::Result;
use tracing::{info, warn};
use watch_log_core::albums::{albums_containing, same_item};
use watch_log_models::{ItemId, MediaKind, RawTimestamp, WatchStatus, WatchedItem};
use watch_log_sources::transfer::parse_watched_at;
use watch_log_sources::MetadataApi;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Title to add; looked up on TMDB when it is configured
    pub title: Option<String>,

    /// Add a specific TMDB title by id
    #[arg(long, conflicts_with = "title")]
    pub tmdb_id: Option<u64>,

    /// movie or tv
    #[arg(long, default_value = "movie")]
    pub kind: MediaKind,

    /// Put it on the watchlist instead of the history
    #[arg(long)]
    pub watchlist: bool,

    /// Star rating, 1-5
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub rating: Option<u8>,

    /// Runtime in minutes
    #[arg(long)]
    pub runtime: Option<u32>,

    /// When it was watched: YYYY-MM-DD, RFC 3339 or epoch seconds (default: now)
    #[arg(long)]
    pub watched: Option<String>,

    /// Comma-separated countries
    #[arg(long)]
    pub country: Option<String>,

    /// Comma-separated genres
    #[arg(long)]
    pub genre: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Do not look the title up on TMDB
    #[arg(long)]
    pub no_lookup: bool,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Id of the item (see `reelog list`)
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    /// Star rating, 0 clears it
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=5))]
    pub rating: Option<u8>,

    #[arg(long)]
    pub runtime: Option<u32>,

    #[arg(long)]
    pub watched: Option<String>,

    #[arg(long)]
    pub country: Option<String>,

    #[arg(long)]
    pub genre: Option<String>,

    /// history or watchlist
    #[arg(long)]
    pub status: Option<WatchStatus>,

    #[arg(long)]
    pub notes: Option<String>,
}

fn parse_date_arg(raw: &str) -> Result<RawTimestamp> {
    parse_watched_at(raw).ok_or_else(|| eyre!("Unrecognized date {:?}; use YYYY-MM-DD", raw))
}

/// Resolve what to add: an explicit TMDB id, the best search hit, or a hand-made item
async fn base_item(args: &AddArgs, ctx: &AppContext, output: &Output) -> Result<WatchedItem> {
    if let Some(id) = args.tmdb_id {
        let api = ctx.metadata()?;
        let details = api
            .details(id, args.kind)
            .await
            .wrap_err_with(|| format!("Failed to fetch TMDB {} {}", args.kind, id))?;
        return Ok(WatchedItem::from_details(details));
    }

    let Some(ref title) = args.title else {
        bail!("Give a title or --tmdb-id");
    };

    if !args.no_lookup && ctx.metadata_available() {
        let api = ctx.metadata()?;
        if let Some(item) = lookup(api.as_ref(), title, args.kind, output).await? {
            return Ok(item);
        }
    }

    let id = ItemId::Text(format!("manual-{}", Utc::now().timestamp_millis()));
    Ok(WatchedItem::new(id, title.clone(), args.kind))
}

async fn lookup(api: &dyn MetadataApi, title: &str, kind: MediaKind, output: &Output) -> Result<Option<WatchedItem>> {
    let results = match api.search(title, Some(kind)).await {
        Ok(results) => results,
        Err(e) => {
            warn!("TMDB search failed, adding without metadata: {}", e);
            output.warn(format!("Lookup failed ({}); adding without metadata.", e));
            return Ok(None);
        }
    };
    let Some(best) = results.into_iter().next() else {
        output.info(format!("No TMDB match for {:?}; adding it as typed.", title));
        return Ok(None);
    };
    let details = api
        .details(best.id, best.media_kind.unwrap_or(kind))
        .await
        .wrap_err_with(|| format!("Failed to fetch details for {}", best.title))?;
    Ok(Some(WatchedItem::from_details(details)))
}

pub async fn run_add(args: AddArgs, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let user = ctx.user()?;
    let mut item = base_item(&args, &ctx, output).await?;

    if args.watchlist {
        item.status = WatchStatus::Watchlist;
        if args.rating.is_some() {
            output.warn("Watchlist items are not rated; ignoring --rating.");
        }
    } else {
        item.rating = args.rating.unwrap_or(0);
        item.watched_at = Some(match args.watched.as_deref() {
            Some(raw) => parse_date_arg(raw)?,
            None => RawTimestamp::from(Utc::now()),
        });
    }
    if let Some(runtime) = args.runtime {
        item.runtime_minutes = runtime;
    }
    if args.country.is_some() {
        item.country = args.country.clone();
    }
    if args.genre.is_some() {
        item.genre = args.genre.clone();
    }
    item.notes = args.notes.clone();

    let created = ctx
        .store()
        .create_item(&user, item)
        .await
        .wrap_err("Failed to add the item")?;
    info!(operation = "add", id = %created.id, status = %created.status, "Added item");

    if output.is_human() {
        output.success(format!("Added {} to your {}", created.title, created.status));
        output.table(&item_table(std::slice::from_ref(&created)));
    } else {
        output.data(&created);
    }
    Ok(())
}

fn find_item(items: &[WatchedItem], raw_id: &str) -> Result<WatchedItem> {
    let id = ItemId::parse(raw_id);
    items
        .iter()
        .find(|item| same_item(&item.id, &id))
        .cloned()
        .ok_or_else(|| eyre!("No item with id {}", raw_id))
}

pub async fn run_update(args: UpdateArgs, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let user = ctx.user()?;
    let snapshot = ctx.snapshot(&user)?;
    let mut item = find_item(&snapshot, &args.id)?;

    if let Some(title) = args.title {
        item.title = title;
    }
    if let Some(status) = args.status {
        if status == WatchStatus::History && item.watched_at.is_none() {
            item.watched_at = Some(RawTimestamp::from(Utc::now()));
        }
        item.status = status;
    }
    if let Some(rating) = args.rating {
        if item.is_watchlist() && rating > 0 {
            output.warn("Rating a watchlist item has no effect until it moves to history.");
        }
        item.rating = rating;
    }
    if let Some(runtime) = args.runtime {
        item.runtime_minutes = runtime;
    }
    if let Some(ref raw) = args.watched {
        item.watched_at = Some(parse_date_arg(raw)?);
    }
    if args.country.is_some() {
        item.country = args.country;
    }
    if args.genre.is_some() {
        item.genre = args.genre;
    }
    if args.notes.is_some() {
        item.notes = args.notes;
    }

    ctx.store()
        .update_item(&user, item.clone())
        .await
        .wrap_err("Failed to update the item")?;
    info!(operation = "update", id = %item.id, "Updated item");

    if output.is_human() {
        output.success(format!("Updated {}", item.title));
        output.table(&item_table(std::slice::from_ref(&item)));
    } else {
        output.data(&item);
    }
    Ok(())
}

pub async fn run_remove(id: String, yes: bool, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let user = ctx.user()?;
    let snapshot = ctx.snapshot(&user)?;
    let item = find_item(&snapshot, &id)?;

    if !yes && prompts::is_interactive() {
        let question = format!("Remove {} ({}) from your collection?", item.title, item.status);
        if !prompts::prompt_yes_no(&question, Some(false))? {
            output.info("Nothing removed.");
            return Ok(());
        }
    }

    let removed = ctx
        .store()
        .delete_item(&user, &item.id)
        .await
        .wrap_err("Failed to remove the item")?;

    // Drop the item from any album that still lists it
    let albums = ctx.store().list_albums(&user).await?;
    let mut touched = 0;
    for album in albums_containing(&albums, &removed.id) {
        let mut album = album.clone();
        album.item_ids.retain(|member| !same_item(member, &removed.id));
        ctx.store().save_album(&user, album).await?;
        touched += 1;
    }
    info!(operation = "remove", id = %removed.id, albums = touched, "Removed item");

    if output.is_human() {
        output.success(format!("Removed {}", removed.title));
        if touched > 0 {
            output.info(format!("Also removed it from {} album(s).", touched));
        }
    } else {
        output.data(&removed);
    }
    Ok(())
}
