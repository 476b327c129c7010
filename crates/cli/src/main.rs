//! hubcache entry point.
//!
//! Drives the offline cache worker from the command line. Results are printed
//! as pretty JSON on stdout; logging goes to stderr so output stays parseable.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hubcache_client::HttpNetwork;
use hubcache_core::{AppConfig, CacheDb, ClientRegistry};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Context;
use commands::fetch::FetchParams;

/// Versioned offline cache for a static site.
#[derive(Parser, Debug)]
#[command(name = "hubcache", author, version, about)]
struct Cli {
    /// SQLite cache store (overrides HUBCACHE_DB_PATH).
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Install and activate the configured version if the store is out of date.
    Update,

    /// Run one request through the activated worker.
    Fetch {
        /// Absolute URL or a path relative to the scope.
        url: String,

        /// Treat the request as a top-level page load.
        #[arg(long)]
        navigate: bool,

        /// HTTP method.
        #[arg(long, default_value = "GET")]
        method: String,
    },

    /// List cache generations in the store.
    Keys,

    /// List request URLs cached in a generation (default: the configured one).
    Entries {
        /// Cache name, e.g. `student-hub-v13`.
        name: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    tracing::debug!(db = %config.db_path.display(), scope = %config.scope, "starting hubcache");

    let storage = Arc::new(CacheDb::open(&config.db_path).await?);
    let network = Arc::new(HttpNetwork::from_config(&config)?);
    let ctx = Context { config, storage, network, clients: Arc::new(ClientRegistry::new(1)) };

    match cli.command {
        Command::Update => print_json(&commands::update::update_impl(&ctx).await?),
        Command::Fetch { url, navigate, method } => {
            let params = FetchParams { url, navigate, method };
            print_json(&commands::fetch::fetch_impl(&ctx, &params).await?)
        }
        Command::Keys => print_json(&commands::cache::keys_impl(&ctx).await?),
        Command::Entries { name } => print_json(&commands::cache::entries_impl(&ctx, name.as_deref()).await?),
    }
}
