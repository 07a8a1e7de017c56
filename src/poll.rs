//! The long-running poll loop and its notification hook.
//!
//! Each iteration runs one [`Pipeline`] cycle, waits a short settle delay,
//! hands the results to a [`Notifier`], then sleeps for the poll interval.
//! Cycle and notifier errors are logged and never stop the loop. Cycles run
//! strictly one after another.

use crate::error::Result;
use crate::models::CycleItem;
use crate::pipeline::Pipeline;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument};

/// Receives the papers queued by a cycle.
pub trait Notifier {
    async fn notify(&self, items: &[CycleItem]) -> Result<()>;
}

/// Notifier that writes each new paper to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, items: &[CycleItem]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        info!(count = items.len(), "New papers found");
        for item in items {
            info!(
                title = %item.title,
                link = %item.link,
                file = %item.file_path.display(),
                "New paper"
            );
        }
        Ok(())
    }
}

/// Drives a pipeline forever.
#[derive(Debug)]
pub struct PollLoop<P, N> {
    pipeline: P,
    notifier: N,
    interval: Duration,
    settle_delay: Duration,
}

impl<P: Pipeline, N: Notifier> PollLoop<P, N> {
    /// Create a poll loop.
    ///
    /// # Arguments
    ///
    /// * `pipeline` - The cycle to run each iteration
    /// * `notifier` - Receives the papers queued by each successful cycle
    /// * `interval` - Sleep between iterations, including failed ones
    /// * `settle_delay` - Pause between a cycle finishing and notification
    pub fn new(pipeline: P, notifier: N, interval: Duration, settle_delay: Duration) -> Self {
        Self {
            pipeline,
            notifier,
            interval,
            settle_delay,
        }
    }

    /// Run one iteration without the trailing interval sleep.
    ///
    /// Returns the number of papers reported, or `None` if the cycle failed.
    #[instrument(level = "info", skip_all)]
    pub async fn tick(&self) -> Option<usize> {
        info!("Checking for new papers");
        let items = match self.pipeline.run_cycle().await {
            Ok(items) => items,
            Err(e) => {
                error!(error = %e, "Cycle failed; retrying next interval");
                return None;
            }
        };

        sleep(self.settle_delay).await;

        if let Err(e) = self.notifier.notify(&items).await {
            error!(error = %e, count = items.len(), "Failed to report new papers");
        }
        Some(items.len())
    }

    /// Loop forever: tick, then sleep for the interval.
    pub async fn run(&self) {
        info!(interval_secs = self.interval.as_secs(), "Poll loop started");
        loop {
            self.tick().await;
            sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScraperError;
    use std::cell::{Cell, RefCell};
    use std::path::PathBuf;

    /// Fails on the cycles listed in `fail_on`, succeeds with one item otherwise.
    struct ScriptedPipeline {
        cycle: Cell<usize>,
        fail_on: Vec<usize>,
    }

    impl Pipeline for ScriptedPipeline {
        async fn run_cycle(&self) -> Result<Vec<CycleItem>> {
            let n = self.cycle.get();
            self.cycle.set(n + 1);
            if self.fail_on.contains(&n) {
                return Err(ScraperError::parse("no date headers (<h3>) found"));
            }
            Ok(vec![CycleItem {
                file_path: PathBuf::from(format!("pdfs/{n}.pdf")),
                title: format!("Paper {n}"),
                link: format!("https://arxiv.org/pdf/{n}.pdf"),
            }])
        }
    }

    #[derive(Default)]
    struct CollectingNotifier {
        seen: RefCell<Vec<CycleItem>>,
        fail: bool,
    }

    impl Notifier for CollectingNotifier {
        async fn notify(&self, items: &[CycleItem]) -> Result<()> {
            self.seen.borrow_mut().extend_from_slice(items);
            if self.fail {
                return Err(ScraperError::network("https://discord.example", "unreachable"));
            }
            Ok(())
        }
    }

    fn poll_loop(
        fail_on: Vec<usize>,
        notifier: CollectingNotifier,
    ) -> PollLoop<ScriptedPipeline, CollectingNotifier> {
        PollLoop::new(
            ScriptedPipeline {
                cycle: Cell::new(0),
                fail_on,
            },
            notifier,
            Duration::from_secs(30),
            Duration::from_secs(5),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycle_does_not_stop_loop() {
        let poll = poll_loop(vec![0], CollectingNotifier::default());

        assert_eq!(poll.tick().await, None);
        assert_eq!(poll.tick().await, Some(1));
        assert_eq!(poll.notifier.seen.borrow().len(), 1);
        assert_eq!(poll.notifier.seen.borrow()[0].title, "Paper 1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_notifier_error_is_swallowed() {
        let notifier = CollectingNotifier {
            fail: true,
            ..Default::default()
        };
        let poll = poll_loop(vec![], notifier);

        assert_eq!(poll.tick().await, Some(1));
        assert_eq!(poll.tick().await, Some(1));
        assert_eq!(poll.notifier.seen.borrow().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_keeps_cycling_through_errors() {
        let poll = poll_loop(vec![0, 2], CollectingNotifier::default());

        // Five minutes of paused time is plenty of intervals.
        let _ = tokio::time::timeout(Duration::from_secs(300), poll.run()).await;

        assert!(poll.pipeline.cycle.get() >= 5);
        assert!(poll.notifier.seen.borrow().len() >= 3);
    }

    #[tokio::test]
    async fn test_log_notifier_accepts_empty_and_full() {
        LogNotifier.notify(&[]).await.unwrap();
        LogNotifier
            .notify(&[CycleItem {
                file_path: PathBuf::from("pdfs/a.pdf"),
                title: "A".to_string(),
                link: "https://arxiv.org/pdf/a.pdf".to_string(),
            }])
            .await
            .unwrap();
    }
}
