use super::context::AppContext;
use super::display::{item_table, page_strip};
use crate::output::Output;
use clap::Args;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing::info;
use watch_log_core::{FilterSpec, ListingState, MediaKindFilter, SortKey, SortOrder};
use watch_log_models::WatchStatus;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Text to look for in the title or original title
    #[arg(short, long)]
    pub search: Option<String>,

    /// Minimum star rating (1-5); watchlist items never match
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=5))]
    pub min_rating: Option<u8>,

    /// Calendar year the item was watched (local time)
    #[arg(long)]
    pub year: Option<i32>,

    /// Text to look for in any of the item's countries
    #[arg(long)]
    pub country: Option<String>,

    /// movie, tv or all
    #[arg(long, default_value = "all")]
    pub kind: MediaKindFilter,

    /// history or watchlist
    #[arg(long)]
    pub status: Option<WatchStatus>,

    /// date, title or runtime (defaults to [display] sort)
    #[arg(long)]
    pub sort: Option<SortKey>,

    /// asc or desc (defaults to [display] order)
    #[arg(long)]
    pub order: Option<SortOrder>,

    /// Page to show, starting at 1
    #[arg(short, long, default_value_t = 1)]
    pub page: usize,

    /// Items per page (defaults to [display] page_size)
    #[arg(long)]
    pub page_size: Option<usize>,
}

impl ListArgs {
    fn filter_spec(&self) -> FilterSpec {
        FilterSpec {
            text_query: self.search.clone(),
            min_rating: self.min_rating,
            year: self.year,
            country_contains: self.country.clone(),
            media_kind: self.kind,
            status: self.status,
        }
    }
}

pub async fn run_list(args: ListArgs, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let user = ctx.user()?;
    let snapshot = ctx.snapshot(&user)?;

    let display = &ctx.config.display;
    let sort_key = match args.sort {
        Some(key) => key,
        None => display.sort.parse::<SortKey>().map_err(|e| eyre!(e))?,
    };
    let sort_order = match args.order {
        Some(order) => order,
        None => display.order.parse::<SortOrder>().map_err(|e| eyre!(e))?,
    };

    let mut state = ListingState::new(args.page_size.unwrap_or(display.page_size));
    state.set_filter(args.filter_spec());
    state.set_sort(sort_key, sort_order);
    state.set_page(args.page);

    let view = state.view(&snapshot);
    info!(
        operation = "list",
        total = snapshot.len(),
        matched = view.total_results,
        page = view.page,
        "Listed collection"
    );

    if !output.is_human() {
        output.data(&view);
        return Ok(());
    }

    if snapshot.is_empty() {
        output.info("Your collection is empty. Add something with `reelog add <title>`.");
        return Ok(());
    }
    if view.is_empty() {
        output.info("Nothing matches those filters.");
        return Ok(());
    }
    if view.items.is_empty() {
        output.warn(format!(
            "Page {} is past the end; there are {} page(s).",
            view.page, view.total_pages
        ));
        return Ok(());
    }

    output.table(&item_table(&view.items));
    output.println(format!(
        "{}   {} result(s), page {} of {}",
        page_strip(&view.window, view.page, view.total_pages),
        view.total_results,
        view.page,
        view.total_pages
    ));
    Ok(())
}
