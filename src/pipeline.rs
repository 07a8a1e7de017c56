//! One full discovery cycle: history → listing → ranking → downloads → history.

use crate::config::SelectorConfig;
use crate::error::Result;
use crate::fetcher::Fetch;
use crate::history::HistoryStore;
use crate::models::CycleItem;
use crate::ranking::rank_and_bound;
use crate::scheduler::DownloadScheduler;
use crate::scrapers::{PageSource, fetch_groups};
use crate::utils::ensure_writable_dir;
use tracing::{info, instrument, warn};

/// A unit of work the poll loop can run repeatedly.
pub trait Pipeline {
    /// Run one cycle and return every paper queued during it.
    async fn run_cycle(&self) -> Result<Vec<CycleItem>>;
}

/// Discovers and downloads new papers from a single listing page.
#[derive(Debug)]
pub struct ArxivScraper<S, F> {
    selectors: SelectorConfig,
    source: S,
    history: HistoryStore,
    scheduler: DownloadScheduler<F>,
    days_limit: usize,
}

impl<S: PageSource, F: Fetch> ArxivScraper<S, F> {
    /// Assemble a scraper.
    ///
    /// # Arguments
    ///
    /// * `selectors` - Where the listing page lives
    /// * `source` - Fetches the listing page, usually with retries
    /// * `history` - The file of already-seen identifiers
    /// * `scheduler` - Runs the downloads and owns the output directory
    /// * `days_limit` - How many date groups closest to today to consider
    pub fn new(
        selectors: SelectorConfig,
        source: S,
        history: HistoryStore,
        scheduler: DownloadScheduler<F>,
        days_limit: usize,
    ) -> Self {
        Self {
            selectors,
            source,
            history,
            scheduler,
            days_limit,
        }
    }
}

impl<S: PageSource, F: Fetch> Pipeline for ArxivScraper<S, F> {
    /// Listing, parse and date errors abort the cycle before history is
    /// touched. A history write failure is returned after downloads finished.
    #[instrument(level = "info", skip_all, fields(base_url = %self.selectors.base_url))]
    async fn run_cycle(&self) -> Result<Vec<CycleItem>> {
        ensure_writable_dir(self.scheduler.output_dir()).await?;
        let history = self.history.load().await?;

        let listing = fetch_groups(&self.source, &self.selectors.base_url).await?;
        let ranked = rank_and_bound(listing.groups, self.days_limit)?;

        let outcome = self
            .scheduler
            .run_cycle(&history, &ranked, &listing.titles)
            .await;
        if !outcome.failed.is_empty() {
            warn!(failed = ?outcome.failed, "Some downloads failed; they will not be retried");
        }

        self.history.save(&outcome.history).await?;
        info!(
            new_papers = outcome.items.len(),
            history = outcome.history.len(),
            "Cycle complete"
        );
        Ok(outcome.items)
    }
}
