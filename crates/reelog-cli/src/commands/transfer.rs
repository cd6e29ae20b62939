use super::context::AppContext;
use crate::output::{styled_table, Output};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use comfy_table::Cell;
use serde_json::json;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use tracing::info;
use watch_log_core::{filter_items, FilterSpec};
use watch_log_models::WatchStatus;
use watch_log_sources::transfer::{import_into_store, read_items, write_items};

pub async fn run_import(file: PathBuf, dry_run: bool, output: &Output) -> Result<()> {
    let reader = File::open(&file).wrap_err_with(|| format!("Failed to open {}", file.display()))?;
    let parsed = read_items(BufReader::new(reader))
        .map_err(|e| eyre!("Failed to read {}: {}", file.display(), e))?;

    for rejected in &parsed.rejected {
        output.warn(format!("Line {}: {}", rejected.line, rejected.reason));
    }

    if dry_run {
        info!(operation = "import", dry_run = true, parsed = parsed.items.len(), "Checked CSV");
        if output.is_human() {
            output.info(format!(
                "{} row(s) would be imported, {} rejected. Nothing was written.",
                parsed.items.len(),
                parsed.rejected.len()
            ));
        } else {
            output.json(&json!({
                "dry_run": true,
                "parsed": parsed.items.len(),
                "rejected": parsed.rejected,
            }));
        }
        return Ok(());
    }

    let ctx = AppContext::load()?;
    let user = ctx.user()?;
    let existing = ctx.snapshot(&user)?;
    let counts = import_into_store(ctx.store(), &user, parsed.items, &existing).await;
    info!(operation = "import", file = %file.display(), added = counts.added, "Imported CSV");

    if !output.is_human() {
        output.json(&json!({
            "counts": counts,
            "rejected": parsed.rejected,
        }));
        return Ok(());
    }

    let mut table = styled_table(["Import", "Rows"]);
    table.add_row(vec![Cell::new("Added"), Cell::new(counts.added)]);
    table.add_row(vec![Cell::new("Already in collection"), Cell::new(counts.already_present)]);
    table.add_row(vec![Cell::new("Failed"), Cell::new(counts.failed)]);
    table.add_row(vec![Cell::new("Rejected"), Cell::new(parsed.rejected.len())]);
    output.table(&table);
    if counts.failed > 0 {
        output.warn("Some rows could not be written; run with -v for details.");
    } else {
        output.success(format!("Imported {} item(s) from {}", counts.added, file.display()));
    }
    Ok(())
}

pub async fn run_export(file: Option<PathBuf>, status: Option<WatchStatus>, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let user = ctx.user()?;
    let snapshot = ctx.snapshot(&user)?;

    let items = match status {
        Some(status) => filter_items(&snapshot, &FilterSpec::default().with_status(status)),
        None => snapshot.to_vec(),
    };

    let written = match file {
        Some(ref path) => {
            let handle = File::create(path).wrap_err_with(|| format!("Failed to create {}", path.display()))?;
            write_items(BufWriter::new(handle), &items)
                .map_err(|e| eyre!("Failed to write {}: {}", path.display(), e))?
        }
        None => write_items(std::io::stdout().lock(), &items).map_err(|e| eyre!("Failed to write CSV: {}", e))?,
    };
    info!(operation = "export", items = written, "Exported collection");

    // stdout carries the CSV itself, so only report when writing to a file
    if let Some(path) = file {
        output.success(format!("Exported {} item(s) to {}", written, path.display()));
    }
    Ok(())
}
