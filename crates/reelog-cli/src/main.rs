use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::eyre;
use commands::albums::{self, AlbumCommands};
use commands::items::{self, AddArgs, UpdateArgs};
use commands::list::{self, ListArgs};
use commands::{clear, config, pick, search, stats, transfer};
use std::path::PathBuf;
use watch_log_config::PathManager;
use watch_log_core::{SortKey, SortOrder};
use watch_log_models::{MediaKind, WatchStatus};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "reelog")]
#[command(about = "Reelog - keep track of every movie and show you watch")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the collection with filters, sorting and paging
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show statistics about what you watched
    Stats {
        /// How many countries and genres to show
        #[arg(long, default_value_t = 5)]
        top: usize,

        /// Count watchlist items too
        #[arg(long, action = ArgAction::SetTrue)]
        include_watchlist: bool,
    },

    /// Pick something to watch at random
    #[command(long_about = "Shuffle through your watchlist and settle on one title. When the watchlist is empty (or with --trending) the pick comes from TMDB's trending titles.")]
    Pick {
        /// Only pick movies or only shows
        #[arg(long)]
        kind: Option<MediaKind>,

        /// Pick from trending titles instead of the watchlist
        #[arg(long, action = ArgAction::SetTrue)]
        trending: bool,

        /// Skip the shuffle animation
        #[arg(long, action = ArgAction::SetTrue)]
        instant: bool,

        /// Do not offer to spin again
        #[arg(long, action = ArgAction::SetTrue)]
        no_prompt: bool,
    },

    /// Add a movie or show to your history or watchlist
    Add(AddArgs),

    /// Change fields of an item
    Update(UpdateArgs),

    /// Remove an item from the collection
    #[command(alias = "rm")]
    Remove {
        id: String,

        /// Do not ask for confirmation
        #[arg(short, long, action = ArgAction::SetTrue)]
        yes: bool,
    },

    /// Search TMDB for titles
    Search {
        query: String,

        #[arg(long)]
        kind: Option<MediaKind>,
    },

    /// Show what is trending on TMDB
    Trending {
        #[arg(long)]
        kind: Option<MediaKind>,

        /// Ignore the cached list and fetch a fresh one
        #[arg(long, action = ArgAction::SetTrue)]
        refresh: bool,
    },

    /// Suggest trending titles that match the genres you watch
    Recommend {
        #[arg(long)]
        kind: Option<MediaKind>,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Manage albums (named lists of items)
    Album {
        #[command(subcommand)]
        cmd: AlbumCommands,
    },

    /// Import items from a CSV file
    Import {
        file: PathBuf,

        /// Parse and report without writing anything
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
    },

    /// Export the collection as CSV (stdout unless --file is given)
    Export {
        #[arg(long)]
        file: Option<PathBuf>,

        /// Only export history or watchlist
        #[arg(long)]
        status: Option<WatchStatus>,
    },

    /// Configure the user, TMDB and display settings
    #[command(long_about = "Manage configuration and credentials for Reelog. Running without a subcommand shows the current configuration.")]
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },

    /// Clear cached data, credentials or the collection itself
    Clear {
        /// Clear cache, credentials and collection data
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,

        /// Clear cached trending lists
        #[arg(long, action = ArgAction::SetTrue)]
        cache: bool,

        /// Clear stored credentials
        #[arg(long, action = ArgAction::SetTrue)]
        credentials: bool,

        /// Delete every stored collection and album
        #[arg(long, action = ArgAction::SetTrue)]
        data: bool,

        /// Do not ask before deleting collection data
        #[arg(short, long, action = ArgAction::SetTrue)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks sensitive data)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Configure TMDB credentials
    #[command(long_about = "Store a TMDB v3 API key or v4 read access token and check it against the API. Prompts for the credential when none is given.")]
    Tmdb {
        #[arg(long)]
        api_key: Option<String>,

        #[arg(long)]
        read_token: Option<String>,

        /// Language for titles and overviews, e.g. en-US
        #[arg(long)]
        language: Option<String>,

        /// Region for trending and release data, e.g. US
        #[arg(long)]
        region: Option<String>,

        /// Save without checking the credential
        #[arg(long, action = ArgAction::SetTrue)]
        skip_verify: bool,
    },

    /// Set whose collection this is
    User {
        id: String,

        #[arg(long)]
        display_name: Option<String>,
    },

    /// Listing defaults
    Display {
        #[arg(long)]
        page_size: Option<usize>,

        /// date, title or runtime
        #[arg(long)]
        sort: Option<SortKey>,

        /// asc or desc
        #[arg(long)]
        order: Option<SortOrder>,
    },

    /// Picker behavior
    Picker {
        /// How long a shuffle runs
        #[arg(long)]
        duration_ms: Option<u64>,

        /// How long trending lists stay cached
        #[arg(long)]
        cache_hours: Option<u64>,

        /// Settle immediately instead of animating
        #[arg(long)]
        instant: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // A broken config file is reported by the command itself; logging falls back to defaults
    let logging_config = commands::context::load_config(&PathManager::default())
        .map(|config| config.logging)
        .unwrap_or_default();
    logging::init_logging(cli.verbose, cli.quiet, &logging_config).map_err(|e| eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::List(args) => list::run_list(args, &output).await,
        Commands::Stats { top, include_watchlist } => stats::run_stats(top, include_watchlist, &output).await,
        Commands::Pick {
            kind,
            trending,
            instant,
            no_prompt,
        } => pick::run_pick(kind, trending, instant, no_prompt, &output).await,
        Commands::Add(args) => items::run_add(args, &output).await,
        Commands::Update(args) => items::run_update(args, &output).await,
        Commands::Remove { id, yes } => items::run_remove(id, yes, &output).await,
        Commands::Search { query, kind } => search::run_search(query, kind, &output).await,
        Commands::Trending { kind, refresh } => search::run_trending(kind, refresh, &output).await,
        Commands::Recommend { kind, limit } => search::run_recommend(kind, limit, &output).await,
        Commands::Album { cmd } => albums::handle_album_command(cmd, &output).await,
        Commands::Import { file, dry_run } => transfer::run_import(file, dry_run, &output).await,
        Commands::Export { file, status } => transfer::run_export(file, status, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(cmd, &output).await
        }
        Commands::Clear {
            all,
            cache,
            credentials,
            data,
            yes,
        } => clear::run_clear(all, cache, credentials, data, yes, &output).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_flags() {
        let cli = Cli::parse_from(["reelog", "list", "--kind", "tv", "--sort", "title", "--order", "asc", "-p", "2"]);
        match cli.command {
            Commands::List(args) => {
                assert_eq!(args.page, 2);
                assert_eq!(args.sort, Some(SortKey::Title));
                assert_eq!(args.order, Some(SortOrder::Ascending));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_min_rating_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["reelog", "list", "--min-rating", "6"]).is_err());
    }
}
