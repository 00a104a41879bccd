//! Inkfeed main entry point
//!
//! This is the command-line interface for the Inkfeed news archiver.

use anyhow::Context;
use clap::Parser;
use inkfeed::archiver::SourceArchiver;
use inkfeed::config::{load_config_with_hash, Config};
use inkfeed::fetch::{build_http_client, FetchOptions};
use inkfeed::images::rewrite_group_images;
use inkfeed::output::write_group_snapshot;
use inkfeed::Renderer;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Inkfeed: a multi-source news archiver
///
/// Inkfeed pulls the current Hacker News front page, Kagi News categories
/// and RSS/Atom feeds, renders each story to HTML and snapshots it together
/// with its images for offline reading.
#[derive(Parser, Debug)]
#[command(name = "inkfeed")]
#[command(version)]
#[command(about = "A multi-source news archiver", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Only archive the named source (repeatable)
    #[arg(long = "source", value_name = "NAME")]
    sources: Vec<String>,

    /// Override the worker-pool size from the config
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=64))]
    max_workers: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(workers) = cli.max_workers {
        config.general.max_workers = usize::from(workers);
    }

    let options = config.general.fetch_options();
    let client = build_http_client(&options.http).context("failed to build HTTP client")?;
    let renderer = Arc::new(Renderer::new());

    let (archived, failed) = archive_sources(&config, &cli.sources, &client, &options, renderer).await;
    tracing::info!(archived, failed, "Run complete");

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("inkfeed=info,warn"),
            1 => EnvFilter::new("inkfeed=debug,info"),
            2 => EnvFilter::new("inkfeed=trace,debug"),
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

/// Runs every enabled source, in config order
///
/// A failing source is reported and skipped. Returns the number of sources
/// archived and the number that failed.
async fn archive_sources(
    config: &Config,
    only: &[String],
    client: &Client,
    options: &FetchOptions,
    renderer: Arc<Renderer>,
) -> (usize, usize) {
    let mut archived = 0;
    let mut failed = 0;

    for source in &config.sources {
        if !source.enabled {
            tracing::debug!(source = %source.name, "Source disabled; skipping");
            continue;
        }
        if !only.is_empty() && !only.iter().any(|name| name == &source.name) {
            continue;
        }

        let archiver = match SourceArchiver::build(source, &config.general.output_dir, renderer.clone()) {
            Ok(archiver) => archiver,
            Err(e) => {
                tracing::error!(source = %source.name, error = %e, "Cannot archive source");
                failed += 1;
                continue;
            }
        };

        tracing::info!(source = %source.name, "Archiving {}", source.display_name);
        match archive_one(&archiver, client, options, config.general.embed_assets).await {
            Ok(articles) => {
                tracing::info!(source = %source.name, articles, "Source archived");
                archived += 1;
            }
            Err(e) => {
                tracing::error!(source = %source.name, error = %e, "Source failed");
                failed += 1;
            }
        }
    }

    (archived, failed)
}

/// Fetches one source, rewrites its images and writes a snapshot per group
async fn archive_one(
    archiver: &SourceArchiver,
    client: &Client,
    options: &FetchOptions,
    embed: bool,
) -> inkfeed::Result<usize> {
    let mut result = archiver.run(Some(client), options).await?;

    for group in &mut result.groups {
        rewrite_group_images(group, Some(client), options, embed).await?;
        let path = write_group_snapshot(group).await?;
        tracing::debug!(group = %group.rel_path, path = %path.display(), "Group written");
    }

    Ok(result.article_count())
}
