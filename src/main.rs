//! Tallr main entry point
//!
//! This is the command-line interface for the Tallr incremental crawler.

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tallr::config::{load_config_with_hash, validate, Config, CrawlerConfig, HttpConfig};
use tallr::crawler::{crawl, is_cancellation, CrawlOutcome};
use tallr::TallrError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Tallr: an incremental podcast listing crawler
///
/// Tallr walks a paginated listing newest first, fetches every item published
/// after the cutoff, and prints the cutoff to use for the next run.
#[derive(Parser, Debug)]
#[command(name = "tallr")]
#[command(version)]
#[command(about = "An incremental podcast listing crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// First listing page (overrides the config file)
    #[arg(long, value_name = "URL", required_unless_present = "config")]
    url: Option<String>,

    /// Maximum number of listing pages to walk
    #[arg(long, value_name = "N")]
    page_limit: Option<usize>,

    /// Maximum number of detail pages fetched at once
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Skip items published at or before this RFC 3339 instant
    #[arg(long, value_name = "RFC3339")]
    cached_until: Option<DateTime<Utc>>,

    /// Cancel the run after this many seconds
    #[arg(long, value_name = "N")]
    deadline_secs: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    let cancel = CancellationToken::new();
    spawn_cancel_triggers(&cancel, cli.deadline_secs);

    tracing::info!(
        "Crawling {} (page limit {}, concurrency {})",
        config.crawler.source_url,
        config.crawler.page_limit,
        config.crawler.concurrency
    );

    let outcome = crawl(&config, cancel).await.map_err(|e| {
        tracing::error!("Crawl failed: {}", e);
        e
    })?;

    print_outcome(&outcome);

    match outcome.errors {
        Some(errors) if outcome.items.is_empty() => Err(TallrError::Crawl(errors).into()),
        _ => Ok(()),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tallr=info,warn"),
            1 => EnvFilter::new("tallr=debug,info"),
            2 => EnvFilter::new("tallr=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the config file if one was given and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => match &cli.url {
            Some(url) => Config {
                crawler: CrawlerConfig::new(url.as_str()),
                http: HttpConfig::default(),
            },
            None => bail!("either a CONFIG file or --url is required"),
        },
    };

    if let Some(url) = &cli.url {
        config.crawler.source_url = url.clone();
    }
    if let Some(page_limit) = cli.page_limit {
        config.crawler.page_limit = page_limit;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
    }
    if let Some(cached_until) = cli.cached_until {
        config.crawler.cached_until = Some(cached_until);
    }

    validate(&config).context("invalid crawl settings")?;
    Ok(config)
}

/// Cancels `cancel` on Ctrl-C or once the deadline passes
fn spawn_cancel_triggers(cancel: &CancellationToken, deadline_secs: Option<u64>) {
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling outstanding requests");
            on_signal.cancel();
        }
    });

    if let Some(secs) = deadline_secs {
        let on_deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            tracing::warn!("Deadline of {}s reached, cancelling outstanding requests", secs);
            on_deadline.cancel();
        });
    }
}

fn print_outcome(outcome: &CrawlOutcome) {
    println!("{} new items", outcome.items.len());
    for item in &outcome.items {
        println!(
            "[{}] {} ({})",
            item.guid,
            item.title,
            item.published_at.to_rfc3339()
        );
    }
    println!("cached until: {}", outcome.cached_until.to_rfc3339());

    if let Some(errors) = &outcome.errors {
        let cancelled = errors.iter().filter(|e| is_cancellation(e)).count();
        println!("{} errors ({} cancelled):", errors.len(), cancelled);
        for error in errors.iter() {
            println!("  - {}", error);
        }
    }
}
