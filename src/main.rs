//! Site-Indexer main entry point
//!
//! This is the command-line interface for the Site-Indexer orchestrator.

use anyhow::Context;
use clap::Parser;
use site_indexer::config::{load_config_with_hash, Config, StaticSiteRegistry};
use site_indexer::crawler::HttpCrawler;
use site_indexer::indexing::{IndexSettings, RunController};
use site_indexer::output::{load_statistics, print_statistics};
use site_indexer::server::{build_router, AppState};
use site_indexer::storage::{lock, open_storage, shared, SharedStorage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Site-Indexer: a single-flight site indexing orchestrator
///
/// Site-Indexer crawls a configured list of websites, replaces each site's
/// stored pages with fresh content, and tracks indexing status per site.
/// Runs are started and stopped over a small HTTP API.
#[derive(Parser, Debug)]
#[command(name = "site-indexer")]
#[command(version = "1.0.0")]
#[command(about = "A single-flight site indexing orchestrator", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be indexed without indexing
    #[arg(long, conflicts_with_all = ["stats", "once"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "once"])]
    stats: bool,

    /// Run one indexing pass over all sites, then exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.once {
        handle_once(&config).await?;
    } else {
        handle_serve(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_indexer=info,warn"),
            1 => EnvFilter::new("site_indexer=debug,info"),
            2 => EnvFilter::new("site_indexer=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== Site-Indexer Dry Run ===\n");

    println!("Indexing Configuration:");
    println!("  Request delay: {}ms", config.indexing.request_delay);
    println!("  Max pages per site: {}", config.indexing.max_pages_per_site);
    println!("  Parallel sites: {}", config.indexing.parallel_sites);
    if config.indexing.site_timeout > 0 {
        println!("  Site timeout: {}s", config.indexing.site_timeout);
    } else {
        println!("  Site timeout: none");
    }
    println!("  Respect robots.txt: {}", config.indexing.respect_robots);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nServer:");
    println!("  Bind address: {}", config.server.bind_address);

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        println!("  - {} ({})", site.name, site.url);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would index {} sites", config.sites.len());
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let stats = load_statistics(&storage, false)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --once mode: a single run, stopped early by Ctrl-C
async fn handle_once(config: &Config) -> anyhow::Result<()> {
    let (controller, storage) = build_controller(config)?;
    let controller = Arc::new(controller);

    controller.start()?;

    let interrupt = {
        let controller = controller.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, stopping indexing");
                let _ = controller.stop();
            }
        })
    };

    let summary = controller.join().await;
    interrupt.abort();

    if let Some(summary) = summary {
        tracing::info!(
            "Run {} finished: {} indexed, {} failed{}",
            summary.run_id,
            summary.indexed,
            summary.failed,
            if summary.cancelled { " (stopped)" } else { "" }
        );
    }

    let stats = load_statistics(&*lock(&storage)?, false)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the default mode: serves the HTTP API until Ctrl-C
async fn handle_serve(config: &Config) -> anyhow::Result<()> {
    let (controller, storage) = build_controller(config)?;
    let controller = Arc::new(controller);

    let app = build_router(AppState {
        controller: controller.clone(),
        storage,
    });

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind_address))?;
    tracing::info!("Listening on {}", config.server.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
            }
        })
        .await
        .context("Server error")?;

    tracing::info!("Shutting down");
    controller.shutdown().await;

    Ok(())
}

fn build_controller(config: &Config) -> anyhow::Result<(RunController, SharedStorage)> {
    let storage = shared(open_storage(Path::new(&config.storage.database_path))?);
    let crawler = HttpCrawler::from_config(config)?;
    let registry = StaticSiteRegistry::from_config(config);

    tracing::info!("{} sites configured", registry.len());

    let controller = RunController::new(
        storage.clone(),
        Arc::new(crawler),
        Arc::new(registry),
        IndexSettings::from_config(config),
    );

    Ok((controller, storage))
}
