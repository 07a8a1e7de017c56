//! Download scheduling for one discovery cycle.
//!
//! The scheduler walks ranked date groups closest-first, skips anything
//! already in history, and queues downloads until the per-cycle quota is
//! reached. Queued downloads run concurrently on the current task, each
//! holding a semaphore permit so no more than `concurrency_cap` requests are
//! in flight. Once every queued download has finished, all identifiers of
//! every group that was iterated are folded into history, including ones
//! skipped by the quota and ones whose download failed.

use crate::error::Result;
use crate::fetcher::Fetch;
use crate::history::HistorySet;
use crate::models::{CycleItem, DownloadTask, Identifier, RankedGroup, Titles};
use crate::utils::short_identifier;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

/// Everything a finished cycle hands back.
#[derive(Debug, Clone, Default)]
pub struct CycleOutcome {
    /// Every queued paper, in queue order, whether or not its download succeeded.
    pub items: Vec<CycleItem>,
    /// History to persist: the input history plus everything observed.
    pub history: HistorySet,
    /// Identifiers whose download failed.
    pub failed: Vec<Identifier>,
}

/// Runs download cycles through a [`Fetch`] implementation.
#[derive(Debug)]
pub struct DownloadScheduler<F> {
    fetcher: F,
    output_dir: PathBuf,
    concurrency_cap: usize,
    item_quota: usize,
}

impl<F: Fetch> DownloadScheduler<F> {
    /// `concurrency_cap` is clamped to at least one.
    pub fn new(
        fetcher: F,
        output_dir: impl Into<PathBuf>,
        concurrency_cap: usize,
        item_quota: usize,
    ) -> Self {
        Self {
            fetcher,
            output_dir: output_dir.into(),
            concurrency_cap: concurrency_cap.max(1),
            item_quota,
        }
    }

    /// Directory every download is written into.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Queue and drain downloads for `ranked` groups not yet in `history`.
    ///
    /// # Arguments
    ///
    /// * `history` - Identifiers seen in earlier cycles; never re-queued
    /// * `ranked` - Date groups, closest to today first
    /// * `titles` - Sanitized title per identifier, used in filenames
    ///
    /// # Returns
    ///
    /// The queued items, the grown history to persist, and the identifiers
    /// whose download failed. Individual download failures never abort the
    /// cycle, so this cannot fail as a whole.
    #[instrument(level = "info", skip_all, fields(groups = ranked.len(), quota = self.item_quota, cap = self.concurrency_cap))]
    pub async fn run_cycle(
        &self,
        history: &HistorySet,
        ranked: &[RankedGroup],
        titles: &Titles,
    ) -> CycleOutcome {
        let t0 = Instant::now();
        let semaphore = Semaphore::new(self.concurrency_cap);
        let mut in_flight = FuturesUnordered::new();
        let mut items = Vec::new();
        let mut observed: Vec<Identifier> = Vec::new();
        // A paper listed under two date headers is still fetched once.
        let mut queued: HashSet<&Identifier> = HashSet::new();

        for ranked_group in ranked {
            let group = &ranked_group.group;
            observed.extend(group.identifiers.iter().cloned());

            for identifier in &group.identifiers {
                if history.contains(identifier) || queued.contains(identifier) {
                    continue;
                }
                if items.len() >= self.item_quota {
                    break;
                }
                queued.insert(identifier);
                let task = self.build_task(identifier, ranked_group, titles);
                info!(link = %task.identifier, group = %task.group_label, "Queuing download");
                items.push(CycleItem::from(&task));
                in_flight.push(self.download(task, &semaphore));
            }

            if items.len() >= self.item_quota {
                debug!(label = %group.label, queued = items.len(), "Quota reached; no more downloads this cycle");
                break;
            }
        }

        let mut failed = Vec::new();
        while let Some((task, outcome)) = in_flight.next().await {
            match outcome {
                Ok(bytes) => debug!(link = %task.identifier, bytes, "Download finished"),
                Err(e) => {
                    error!(link = %task.identifier, error = %e, "Download failed");
                    failed.push(task.identifier);
                }
            }
        }

        let mut updated = history.clone();
        updated.merge(observed);

        info!(
            queued = items.len(),
            failed = failed.len(),
            newly_seen = updated.len() - history.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Download cycle finished"
        );

        CycleOutcome {
            items,
            history: updated,
            failed,
        }
    }

    fn build_task(
        &self,
        identifier: &Identifier,
        ranked_group: &RankedGroup,
        titles: &Titles,
    ) -> DownloadTask {
        let short_id = short_identifier(identifier);
        let title = match titles.get(identifier) {
            Some(title) => title.clone(),
            None => {
                warn!(link = %identifier, "No title for paper; using its identifier");
                short_id.to_string()
            }
        };
        let filename = format!("{}__{}__{}.pdf", short_id, ranked_group.short_date(), title);

        DownloadTask {
            identifier: identifier.clone(),
            title,
            target: self.output_dir.join(filename),
            group_label: ranked_group.group.label.clone(),
        }
    }

    /// Hold a permit for the whole fetch; it is released on every exit path.
    async fn download(
        &self,
        task: DownloadTask,
        semaphore: &Semaphore,
    ) -> (DownloadTask, Result<u64>) {
        // Never closed, so `acquire` cannot fail here.
        let _permit = semaphore.acquire().await.ok();
        let outcome = self.fetcher.fetch(&task.identifier, &task.target).await;
        (task, outcome)
    }
}
