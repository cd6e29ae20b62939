use super::context::AppContext;
use super::display::stars;
use crate::output::{styled_table, Output};
use color_eyre::Result;
use comfy_table::Cell;
use owo_colors::OwoColorize;
use tracing::info;
use watch_log_core::{aggregate, top_entries, FilterSpec, StatsSummary};
use watch_log_core::filter::filter_items;
use watch_log_models::WatchStatus;

pub async fn run_stats(top: usize, include_watchlist: bool, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let user = ctx.user()?;
    let snapshot = ctx.snapshot(&user)?;

    let items = if include_watchlist {
        snapshot.to_vec()
    } else {
        filter_items(&snapshot, &FilterSpec::default().with_status(WatchStatus::History))
    };
    let summary = aggregate(&items);
    info!(operation = "stats", items = summary.total_items, "Aggregated collection");

    if !output.is_human() {
        output.data(&summary);
        return Ok(());
    }
    if summary.is_empty() {
        output.info("Nothing watched yet, so there are no statistics to show.");
        return Ok(());
    }
    print_summary(&summary, top, output);
    Ok(())
}

fn print_summary(summary: &StatsSummary, top: usize, output: &Output) {
    let mut overview = styled_table(["Overview", ""]);
    overview.add_row(vec![Cell::new("Items"), Cell::new(summary.total_items)]);
    for (kind, count) in &summary.by_kind {
        overview.add_row(vec![Cell::new(format!("  {}", kind)), Cell::new(count)]);
    }
    let runtime = summary.runtime;
    overview.add_row(vec![
        Cell::new("Time watched"),
        Cell::new(format!(
            "{}d {}h {}m ({} minutes)",
            runtime.days, runtime.hours, runtime.minutes, runtime.total_minutes
        )),
    ]);
    overview.add_row(vec![
        Cell::new("Average rating"),
        Cell::new(if summary.rated_items == 0 {
            "-".to_string()
        } else {
            format!("{:.2} from {} rated", summary.average_rating, summary.rated_items)
        }),
    ]);
    output.table(&overview);

    let mut ratings = styled_table(["Rating", "Items"]);
    for (rating, count) in summary.by_rating.iter().rev() {
        ratings.add_row(vec![Cell::new(stars(*rating)), Cell::new(count)]);
    }
    output.table(&ratings);

    if !summary.by_year.is_empty() {
        let mut years = styled_table(["Year", "Items"]);
        for (year, count) in summary.by_year.iter().rev() {
            years.add_row(vec![Cell::new(year), Cell::new(count)]);
        }
        output.table(&years);
    }

    for (title, counts) in [("Country", &summary.by_country), ("Genre", &summary.by_genre)] {
        let entries = top_entries(counts, top);
        if entries.is_empty() {
            output.println(format!("{}", format!("No {} data", title.to_lowercase()).bright_black()));
            continue;
        }
        let mut table = styled_table([title, "Items"]);
        for (name, count) in entries {
            table.add_row(vec![Cell::new(name), Cell::new(count)]);
        }
        output.table(&table);
    }
}
