use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use capedeck::catalog::{SortKey, TimeWindow};
use capedeck::commands::{BrowseOptions, cmd_browse, cmd_favorites, cmd_owned, default_catalog_path};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "capedeck")]
#[command(about = "Browse a cape catalog with paging, owned capes and favorites")]
#[command(version)]
struct Cli {
    /// Catalog JSON document (default: .capedeck/catalog.json)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the whole catalog
    #[command(visible_alias = "b")]
    Browse {
        /// Sort order: newest, oldest, mostUsed
        #[arg(short, long, value_parser = parse_sort)]
        sort: Option<SortKey>,

        /// Time window: weekly, monthly, allTime
        #[arg(short, long, value_parser = parse_window)]
        window: Option<TimeWindow>,

        /// Look up the capes of a player instead of browsing
        #[arg(long)]
        search: Option<String>,

        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: u32,
    },

    /// List capes owned by an identity
    Owned {
        /// Identity to list (default: configured identity)
        #[arg(short, long)]
        identity: Option<String>,
    },

    /// Resolve favorite cape ids
    #[command(visible_alias = "fav")]
    Favorites {
        /// Cape ids in favorite order
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

fn parse_sort(s: &str) -> Result<SortKey, String> {
    s.parse().map_err(|e: capedeck::CatalogError| e.to_string())
}

fn parse_window(s: &str) -> Result<TimeWindow, String> {
    s.parse().map_err(|e: capedeck::CatalogError| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("capedeck=info")),
        )
        .init();

    let cli = Cli::parse();
    let catalog = cli.catalog.unwrap_or_else(default_catalog_path);

    let result = match cli.command {
        Commands::Browse {
            sort,
            window,
            search,
            pages,
        } => {
            cmd_browse(
                &catalog,
                BrowseOptions {
                    sort,
                    window,
                    search,
                    pages,
                    output_json: cli.json,
                },
            )
            .await
        }
        Commands::Owned { identity } => cmd_owned(&catalog, identity, cli.json).await,
        Commands::Favorites { ids } => cmd_favorites(&catalog, &ids, cli.json).await,
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
