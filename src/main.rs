//! # arxiv_watch
//!
//! Watches an arXiv listing page and downloads newly announced papers.
//!
//! ## Usage
//!
//! ```sh
//! arxiv_watch --selectors selectors.json --output-dir pdfs
//! ```

use arxiv_watch::cli::Cli;
use arxiv_watch::config::SelectorConfig;
use arxiv_watch::fetcher::{HttpFetcher, build_http_client};
use arxiv_watch::history::HistoryStore;
use arxiv_watch::pipeline::{ArxivScraper, Pipeline};
use arxiv_watch::poll::{LogNotifier, Notifier, PollLoop};
use arxiv_watch::scheduler::DownloadScheduler;
use arxiv_watch::scrapers::{HttpPageSource, RetryPageSource};
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

const LISTING_RETRIES: usize = 2;
const LISTING_RETRY_BASE: Duration = Duration::from_secs(1);

#[tokio::main(flavor = "current_thread")]
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

    info!("arxiv_watch starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // Startup-fatal: nothing to poll without a valid listing URL.
    let selectors = match SelectorConfig::load(&args.selectors) {
        Ok(selectors) => selectors,
        Err(e) => {
            error!(path = %args.selectors.display(), error = %e, "Invalid selector configuration");
            return Err(e.into());
        }
    };

    let client = build_http_client(Duration::from_secs(args.timeout_secs))?;
    let source = RetryPageSource::new(
        HttpPageSource::new(client.clone()),
        LISTING_RETRIES,
        LISTING_RETRY_BASE,
    );
    let scheduler = DownloadScheduler::new(
        HttpFetcher::new(client),
        &args.output_dir,
        usize::from(args.max_concurrency),
        args.pdf_limit,
    );
    let scraper = ArxivScraper::new(
        selectors,
        source,
        HistoryStore::new(&args.history_file),
        scheduler,
        args.days_limit,
    );

    if args.once {
        let items = scraper.run_cycle().await?;
        LogNotifier.notify(&items).await?;
        info!(count = items.len(), "Single cycle complete");
        return Ok(());
    }

    PollLoop::new(
        scraper,
        LogNotifier,
        Duration::from_secs(args.interval_secs),
        Duration::from_secs(args.settle_secs),
    )
    .run()
    .await;

    Ok(())
}
