use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use skt_scraper::server::{self, StreamsResponse};
use skt_scraper::{Episode, LookupRequest, MediaKind, ScraperConfig, StreamFinder, TitlePair, generate_queries};

#[derive(Parser)]
#[command(name = "skt-scraper", version, about = "Finds SKTonline streams for IMDb titles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (JSON); defaults to the per-user config directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP endpoint
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:8888")]
        bind: SocketAddr,
    },

    /// Look up streams for one title and print them as JSON
    Lookup {
        /// IMDb id, e.g. tt0167116
        imdb_id: String,

        #[arg(short = 't', long = "type", value_enum, default_value_t = Kind::Movie)]
        kind: Kind,

        #[arg(short, long)]
        season: Option<u32>,

        #[arg(short, long)]
        episode: Option<u32>,

        /// Print the full run report instead of just the streams
        #[arg(long)]
        report: bool,
    },

    /// Print the search queries generated for a title (no network)
    Queries {
        title: String,

        /// Original title; defaults to the title
        #[arg(short, long)]
        original: Option<String>,

        #[arg(short = 't', long = "type", value_enum, default_value_t = Kind::Movie)]
        kind: Kind,

        #[arg(short, long)]
        season: Option<u32>,

        #[arg(short, long)]
        episode: Option<u32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Movie,
    Series,
}

impl From<Kind> for MediaKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Movie => MediaKind::Movie,
            Kind::Series => MediaKind::Series,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs vão para stderr, stdout fica só com o JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Queries {
            title,
            original,
            kind,
            season,
            episode,
        } => {
            let titles = TitlePair {
                original_title: original.unwrap_or_else(|| title.clone()),
                title,
            };
            let queries = generate_queries(&titles, kind.into(), Episode::from_parts(season, episode));
            print!("{queries}");
        }
        Commands::Lookup {
            imdb_id,
            kind,
            season,
            episode,
            report,
        } => {
            let finder = build_finder(cli.config.as_deref())?;
            let request = LookupRequest {
                imdb_id,
                kind: kind.into(),
                episode: Episode::from_parts(season, episode),
            };
            let run = finder.run(&request).await;
            let output = if report {
                serde_json::to_string_pretty(&run)?
            } else {
                serde_json::to_string_pretty(&StreamsResponse { streams: run.streams })?
            };
            println!("{output}");
        }
        Commands::Serve { bind } => {
            let finder = build_finder(cli.config.as_deref())?;
            if let Err(e) = server::serve(bind, finder).await {
                tracing::error!("server stopped: {}", e);
                return Err(e).context("HTTP server failed");
            }
        }
    }

    Ok(())
}

// Carrega a configuração e monta os clientes HTTP
fn build_finder(config_path: Option<&std::path::Path>) -> Result<StreamFinder> {
    let config = ScraperConfig::load(config_path).context("Failed to load configuration")?;
    StreamFinder::from_config(Arc::new(config)).context("Failed to set up HTTP clients")
}
