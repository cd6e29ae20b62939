use super::context::AppContext;
use super::display::item_table;
use super::prompts;
use crate::output::{styled_table, Output};
use clap::Subcommand;
use color_eyre::eyre::{bail, eyre};
use color_eyre::Result;
use comfy_table::Cell;
use serde_json::json;
use tracing::info;
use watch_log_core::albums::same_item;
use watch_log_core::{album_items, find_album};
use watch_log_models::{Album, ItemId};
use watch_log_sources::UserId;

#[derive(Subcommand, Debug)]
pub enum AlbumCommands {
    /// List albums
    List,
    /// Create an empty album
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show the items in an album
    Show { album: String },
    /// Add items to an album
    Add {
        album: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Remove items from an album
    Remove {
        album: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Delete an album (its items stay in the collection)
    Delete {
        album: String,
        #[arg(short, long)]
        yes: bool,
    },
}

/// Album id derived from its name: lowercase ASCII words joined by '-'
fn album_slug(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

async fn load_album(ctx: &AppContext, user: &UserId, key: &str) -> Result<Album> {
    let albums = ctx.store().list_albums(user).await?;
    find_album(&albums, key)
        .cloned()
        .ok_or_else(|| eyre!("No album named {:?}. See `reelog album list`.", key))
}

pub async fn handle_album_command(cmd: AlbumCommands, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let user = ctx.user()?;

    match cmd {
        AlbumCommands::List => {
            let albums = ctx.store().list_albums(&user).await?;
            if !output.is_human() {
                output.data(&albums);
                return Ok(());
            }
            if albums.is_empty() {
                output.info("No albums yet. Create one with `reelog album create <name>`.");
                return Ok(());
            }
            let mut table = styled_table(["ID", "Name", "Items", "Description"]);
            for album in &albums {
                table.add_row(vec![
                    Cell::new(&album.id),
                    Cell::new(&album.name),
                    Cell::new(album.item_ids.len()),
                    Cell::new(album.description.as_deref().unwrap_or("")),
                ]);
            }
            output.table(&table);
        }
        AlbumCommands::Create { name, description } => {
            let name = name.trim().to_string();
            let id = album_slug(&name);
            if id.is_empty() {
                bail!("Album name needs at least one letter or digit");
            }
            let albums = ctx.store().list_albums(&user).await?;
            if find_album(&albums, &id).is_some() || find_album(&albums, &name).is_some() {
                bail!("An album called {:?} already exists", name);
            }
            let mut album = Album::new(id, name);
            album.description = description;
            ctx.store().save_album(&user, album.clone()).await?;
            info!(operation = "album_create", album = %album.id, "Created album");
            if output.is_human() {
                output.success(format!("Created album {} ({})", album.name, album.id));
            } else {
                output.data(&album);
            }
        }
        AlbumCommands::Show { album } => {
            let album = load_album(&ctx, &user, &album).await?;
            let snapshot = ctx.snapshot(&user)?;
            let items = album_items(&album, &snapshot);
            if !output.is_human() {
                output.json(&json!({ "album": album, "items": items }));
                return Ok(());
            }
            output.println(format!("{} - {} item(s)", album.name, items.len()));
            if let Some(ref description) = album.description {
                output.println(description);
            }
            if !items.is_empty() {
                output.table(&item_table(&items));
            }
        }
        AlbumCommands::Add { album, ids } => {
            let mut album = load_album(&ctx, &user, &album).await?;
            let snapshot = ctx.snapshot(&user)?;
            let mut added = 0;
            for raw in &ids {
                let wanted = ItemId::parse(raw);
                let Some(item) = snapshot.iter().find(|item| same_item(&item.id, &wanted)) else {
                    output.warn(format!("No item with id {}; skipped.", raw));
                    continue;
                };
                let already = album.item_ids.iter().any(|member| same_item(member, &item.id));
                if !already && album.add_item(item.id.clone()) {
                    added += 1;
                }
            }
            ctx.store().save_album(&user, album.clone()).await?;
            info!(operation = "album_add", album = %album.id, added, "Updated album");
            if output.is_human() {
                output.success(format!("Added {} item(s) to {}", added, album.name));
            } else {
                output.data(&album);
            }
        }
        AlbumCommands::Remove { album, ids } => {
            let mut album = load_album(&ctx, &user, &album).await?;
            let before = album.item_ids.len();
            for raw in &ids {
                let unwanted = ItemId::parse(raw);
                album.item_ids.retain(|member| !same_item(member, &unwanted));
            }
            let removed = before - album.item_ids.len();
            ctx.store().save_album(&user, album.clone()).await?;
            info!(operation = "album_remove", album = %album.id, removed, "Updated album");
            if output.is_human() {
                output.success(format!("Removed {} item(s) from {}", removed, album.name));
            } else {
                output.data(&album);
            }
        }
        AlbumCommands::Delete { album, yes } => {
            let album = load_album(&ctx, &user, &album).await?;
            if !yes && prompts::is_interactive() {
                let question = format!("Delete album {} ({} items)?", album.name, album.item_ids.len());
                if !prompts::prompt_yes_no(&question, Some(false))? {
                    output.info("Album kept.");
                    return Ok(());
                }
            }
            let deleted = ctx.store().delete_album(&user, &album.id).await?;
            info!(operation = "album_delete", album = %deleted.id, "Deleted album");
            if output.is_human() {
                output.success(format!("Deleted album {}", deleted.name));
            } else {
                output.data(&deleted);
            }
        }
    }
    Ok(())
}
