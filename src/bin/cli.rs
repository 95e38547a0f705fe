// src/bin/cli.rs

//! repowatch CLI
//!
//! Serves the repository cache over HTTP, or runs a single refresh cycle.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use repowatch::{
    cache::RepositoryCache,
    error::Result,
    filter::Predicate,
    models::Config,
    pipeline::RefreshCycle,
    server,
    utils::http::{self, JsonClient},
};

/// Exit status when configuration cannot be built.
const EXIT_CONFIG: u8 = 1;
/// Exit status when the HTTP server fails.
const EXIT_SERVE: u8 = 2;

/// repowatch - recently active GitHub repositories
#[derive(Parser, Debug)]
#[command(name = "repowatch", version, about = "Recently active GitHub repositories")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "repowatch.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve /ping and /repos from the self-refreshing cache (default)
    Serve {
        /// Override the listening port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one discovery and fetch cycle and print the records as JSON
    Snapshot {
        /// Only print records matching this expression
        #[arg(long)]
        filter: Option<String>,
    },

    /// Validate configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// File values, then environment overrides, then validation.
fn load_config(path: &Path, port: Option<u16>) -> Result<Config> {
    let mut config = Config::load_or_default(path)?;
    config.apply_env()?;
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;
    Ok(config)
}

fn create_client(config: &Config) -> Result<Arc<dyn JsonClient>> {
    Ok(Arc::new(http::create_api_client(&config.feed)?))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Initializing repowatch");

    let command = cli.command.unwrap_or(Command::Serve { port: None });
    let port = match &command {
        Command::Serve { port } => *port,
        _ => None,
    };

    let (config, client) = match load_config(&cli.config, port)
        .and_then(|config| create_client(&config).map(|client| (config, client)))
    {
        Ok(loaded) => loaded,
        Err(e) => {
            log::error!("Fail to initialize configuration: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    match command {
        Command::Serve { .. } => {
            let cache = RepositoryCache::start(&config, client).await;
            if let Err(e) = server::serve(cache, config.server.port).await {
                log::error!("Fail to listen on port {}: {}", config.server.port, e);
                return ExitCode::from(EXIT_SERVE);
            }
        }

        Command::Snapshot { filter } => {
            let predicate = match filter.as_deref().map(Predicate::parse).transpose() {
                Ok(predicate) => predicate,
                Err(e) => {
                    log::error!("Can not parse filter: {}", e);
                    return ExitCode::FAILURE;
                }
            };

            let mut records = RefreshCycle::new(&config, client).run().await;
            if let Some(predicate) = predicate {
                records.retain(|record| predicate.matches(record));
            }

            match serde_json::to_string_pretty(&records) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    log::error!("Fail to encode JSON: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }

        Command::Validate => {
            log::info!("✓ Config OK");
            log::info!("  event feed: {}", config.feed.event_url);
            log::info!(
                "  refresh every {}s, {} concurrent fetches",
                config.cache.refresh_secs,
                config.cache.max_concurrent
            );
            log::info!("  projection rules: {}", config.projection.len());
        }
    }

    ExitCode::SUCCESS
}
