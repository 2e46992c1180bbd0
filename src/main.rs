//! # Regional News
//!
//! Command-line front end: loads the configuration, runs one aggregation and
//! writes the ranked digest as JSON.
//!
//! ## Usage
//!
//! ```sh
//! regional_news -j ./json -p ./seen.json --keyword istanbul
//! ```
//!
//! ## Flow
//!
//! 1. **Configure**: YAML file (or built-in sources), CLI overrides on top
//! 2. **Aggregate**: fetch, extract, filter, dedup and rank every source
//! 3. **Output**: `{json_output_dir}/{date}/{edition}.json` plus the updated seen set

use chrono::Local;
use clap::Parser;
use itertools::Itertools;
use regional_news::cli::Cli;
use regional_news::outputs::{json, seen};
use regional_news::utils::{ensure_writable_dir, time_of_day};
use regional_news::{Aggregator, Config, PreviousItemSet};
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("regional_news starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration ----
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => {
            info!("No configuration file given; using built-in sources");
            Config::default()
        }
    };
    let mut request = config.request.to_request()?;
    if let Some(concurrency) = args.concurrency {
        request.concurrency = concurrency;
    }
    if let Some(max_items) = args.max_items {
        request.max_items = max_items;
    }
    if !args.keywords.is_empty() {
        request.keywords = args.keywords.clone();
    }
    info!(
        sources = config.sources.len(),
        keywords = request.keywords.len(),
        concurrency = request.concurrency,
        max_items = request.max_items,
        "Configuration ready"
    );

    if !args.dry_run {
        if let Err(e) = ensure_writable_dir(&args.json_output_dir).await {
            error!(
                path = %args.json_output_dir,
                error = %e,
                "JSON output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let previous = match &args.previous {
        Some(path) => seen::load_seen(path).await,
        None => PreviousItemSet::new(),
    };

    // ---- Aggregate ----
    let mut aggregator = Aggregator::http(&request.fetch)?;
    let digest = aggregator.run(&request, &config.sources, &previous).await?;
    info!(
        per_source = %digest
            .stats
            .per_source
            .iter()
            .map(|(name, count)| format!("{name}:{count}"))
            .join(", "),
        "Items per source"
    );

    // ---- Output ----
    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&digest)?);
    } else {
        let edition = time_of_day();
        let date = Local::now().date_naive();
        json::write_digest(&digest, &args.json_output_dir, date, &edition).await?;

        if let Some(path) = &args.previous {
            if let Err(e) = seen::save_seen(path, &previous, &digest).await {
                error!(path = %path, error = %e, "Failed to update seen set");
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        total = digest.stats.total,
        new = digest.stats.new,
        seen = digest.stats.seen,
        "Execution complete"
    );

    Ok(())
}
