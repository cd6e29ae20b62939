use super::context::AppContext;
use super::display::candidate_table;
use crate::output::{styled_table, Output};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use comfy_table::Cell;
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{info, warn};
use watch_log_core::recommend;
use watch_log_models::MediaKind;
use watch_log_sources::MetadataApi;

pub async fn run_search(query: String, kind: Option<MediaKind>, output: &Output) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        return Err(eyre!("Search query cannot be empty"));
    }

    let ctx = AppContext::load()?;
    let api = ctx.metadata()?;
    let results = api
        .search(query, kind)
        .await
        .wrap_err_with(|| format!("TMDB search for {:?} failed", query))?;
    info!(operation = "search", query, results = results.len(), "Searched metadata");

    if !output.is_human() {
        output.data(&results);
        return Ok(());
    }
    if results.is_empty() {
        output.info(format!("No results for {:?}.", query));
        return Ok(());
    }
    output.table(&candidate_table(&results));
    output.info("Add one with `reelog add --tmdb-id <id> --kind <movie|tv>`.");
    Ok(())
}

pub async fn run_trending(kind: Option<MediaKind>, refresh: bool, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let api = ctx.metadata()?;
    let cache = ctx.trending_cache()?;

    if refresh {
        let removed = cache
            .clear()
            .map_err(|e| eyre!("Failed to clear the trending cache: {}", e))?;
        info!("Cleared {} cached trending list(s)", removed);
    }

    let candidates = cache
        .get_or_fetch(api.as_ref(), kind)
        .await
        .map_err(|e| eyre!("Failed to load trending titles: {}", e))?;
    info!(operation = "trending", results = candidates.len(), "Loaded trending titles");

    if !output.is_human() {
        output.data(&candidates);
        return Ok(());
    }
    if candidates.is_empty() {
        output.info("TMDB returned no trending titles.");
        return Ok(());
    }
    output.table(&candidate_table(&candidates));
    Ok(())
}

/// Genre tables for every kind we might see; a failed lookup only loses genre matching
async fn genre_names(api: &dyn MetadataApi, kind: Option<MediaKind>) -> HashMap<u32, String> {
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => vec![MediaKind::Movie, MediaKind::Tv],
    };
    let tables = join_all(kinds.iter().map(|kind| api.genres(*kind))).await;
    let mut names = HashMap::new();
    for (kind, table) in kinds.iter().zip(tables) {
        match table {
            Ok(table) => names.extend(table),
            Err(e) => warn!("Failed to load {} genres: {}", kind, e),
        }
    }
    names
}

pub async fn run_recommend(kind: Option<MediaKind>, limit: usize, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let user = ctx.user()?;
    let api = ctx.metadata()?;
    let snapshot = ctx.snapshot(&user)?;

    let candidates = ctx
        .trending_cache()?
        .get_or_fetch(api.as_ref(), kind)
        .await
        .map_err(|e| eyre!("Failed to load trending titles: {}", e))?;
    let genres = genre_names(api.as_ref(), kind).await;
    let ranked = recommend(&snapshot, &candidates, &genres, limit);
    info!(
        operation = "recommend",
        candidates = candidates.len(),
        returned = ranked.len(),
        "Ranked recommendations"
    );

    if !output.is_human() {
        output.data(&ranked);
        return Ok(());
    }
    if ranked.is_empty() {
        output.info("No recommendations right now; you already have everything that is trending.");
        return Ok(());
    }

    let mut table = styled_table(["TMDB ID", "Title", "Kind", "Score", "Because you watch"]);
    for rec in &ranked {
        let candidate = &rec.candidate;
        table.add_row(vec![
            Cell::new(candidate.id),
            Cell::new(&candidate.title),
            Cell::new(candidate.media_kind.map_or("-".to_string(), |k| k.to_string())),
            Cell::new(format!("{:.2}", rec.score)),
            Cell::new(if rec.matched_genres.is_empty() {
                "-".to_string()
            } else {
                rec.matched_genres.join(", ")
            }),
        ]);
    }
    output.table(&table);
    Ok(())
}
