//! # nyt_feed
//!
//! A terminal news reader over the New York Times APIs. It loads the newest
//! search results, paginates through the Top Stories sections on request,
//! groups everything by publication date, and can keep the feed fresh by
//! refreshing it periodically.
//!
//! ## Usage
//!
//! ```sh
//! NYT_API_KEY=... nyt_feed -p 2 -j ./json -m ./markdown
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: [`feed::FeedReader`] runs the initial, load-more and
//!    refresh operations against an [`api::NewsApi`]
//! 2. **State**: every outcome is applied to a [`store::FeedState`]
//! 3. **Grouping**: [`grouping::group_by_date`] buckets the articles per day
//! 4. **Output**: Markdown to stdout, plus optional JSON and Markdown files

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod feed;
mod grouping;
mod models;
mod outputs;
mod store;
mod utils;

use api::{NewsApi, NytClient};
use cli::Cli;
use config::FeedConfig;
use feed::{FeedReader, FeedSettings, RefreshOutcome};
use outputs::json::{FeedSnapshot, write_snapshot};
use outputs::markdown::{feed_to_markdown, write_markdown};
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("nyt_feed starting up");

    let args = Cli::parse();
    debug!(?args.config, pages = args.pages, watch = args.watch, "Parsed CLI arguments");

    let mut config = FeedConfig::load(args.config.as_deref())?;
    args.apply_overrides(&mut config);

    let Some(api_key) = args.nyt_api_key.as_deref() else {
        error!("No API key given; pass --nyt-api-key or set NYT_API_KEY");
        return Err("missing NYT API key".into());
    };

    // Early check: output dirs must be writable before we fetch anything
    for dir in [&args.json_output_dir, &args.markdown_output_dir].into_iter().flatten() {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Output directory is not writable");
            return Err(e);
        }
    }

    let client = NytClient::new(&config.api_base, api_key)?;
    info!(api_base = %config.api_base, sections = config.sections.len(), "Feed configured");
    let mut reader = FeedReader::new(client, FeedSettings::from(&config));

    // ---- Initial load, with the retry action ----
    let mut result = reader.fetch_initial().await;
    let mut attempt = 0;
    while result.is_err() && attempt < args.retries {
        attempt += 1;
        warn!(attempt, max = args.retries, "Retrying initial fetch");
        result = reader.retry().await;
    }

    // ---- Pagination ----
    for page in 0..args.pages {
        match reader.load_more_if_idle().await {
            Ok(Some(added)) => debug!(page, added, "Loaded page"),
            Ok(None) => {
                info!(page, "No more sections to load");
                break;
            }
            Err(e) => {
                warn!(page, error = %e, "Stopping pagination");
                break;
            }
        }
    }

    emit(&reader, &args).await;

    if args.watch {
        watch(&mut reader, &args, &config).await;
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        articles = reader.state().articles.len(),
        "Execution complete"
    );
    Ok(())
}

/// Refresh on every tick until Ctrl-C.
#[instrument(level = "info", skip_all)]
async fn watch<A: NewsApi>(reader: &mut FeedReader<A>, args: &Cli, config: &FeedConfig) {
    let mut ticker = tokio::time::interval(config.refresh_interval());
    // The first tick completes immediately; the feed was just loaded.
    ticker.tick().await;
    info!(interval_secs = config.refresh_interval_secs, "Watching for new articles (Ctrl-C to stop)");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match reader.refresh().await {
                    Ok(RefreshOutcome::Replaced(count)) => {
                        info!(count, "Feed refreshed");
                        emit(reader, args).await;
                    }
                    Ok(outcome) => debug!(?outcome, "Feed left unchanged"),
                    Err(e) => debug!(error = %e, "Refresh failed; keeping current feed"),
                }
            }
            _ = &mut ctrl_c => {
                info!("Interrupted; stopping watch");
                break;
            }
        }
    }
}

/// Render the feed to stdout and write any configured outputs.
async fn emit<A: NewsApi>(reader: &FeedReader<A>, args: &Cli) {
    let state = reader.state();
    let groups = grouping::group_by_date(&state.articles);
    let md = feed_to_markdown(state, &groups);
    println!("{md}");

    if let Some(dir) = &args.json_output_dir {
        let snapshot = FeedSnapshot::new(state, &groups);
        if let Err(e) = write_snapshot(&snapshot, dir).await {
            error!(error = %e, "Failed to write JSON snapshot");
        }
    }

    if let Some(dir) = &args.markdown_output_dir {
        if let Err(e) = write_markdown(&md, dir).await {
            error!(error = %e, "Failed to write Markdown");
        }
    }
}
