//! Fetching listing pages with exponential backoff retry logic.
//!
//! # Architecture
//!
//! - [`PageSource`]: core trait for fetching a page body as text
//! - [`HttpPageSource`]: `reqwest` implementation
//! - [`RetryPageSource`]: decorator that adds retry logic to any `PageSource`
//!
//! # Retry Strategy
//!
//! - Exponential backoff starting at `base_delay`
//! - Delay capped at `max_delay`
//! - Random jitter (0-250ms) added to every wait

use crate::error::{Result, ScraperError};
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};
use url::Url;

/// Anything that can return the body of a page.
pub trait PageSource {
    /// Fetch `url` and return its body as text.
    ///
    /// Fails with [`ScraperError::Network`] on transport errors or a
    /// non-success status.
    async fn get_page(&self, url: &Url) -> Result<String>;
}

/// [`PageSource`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: reqwest::Client,
}

impl HttpPageSource {
    /// Wrap a client built by [`crate::fetcher::build_http_client`].
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl PageSource for HttpPageSource {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn get_page(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ScraperError::network(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::network(
                url.as_str(),
                format!("HTTP status {status}"),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| ScraperError::network(url.as_str(), e))
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`PageSource`].
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryPageSource<T> {
    /// The source to wrap.
    inner: T,
    /// Retries after the first attempt before giving up.
    max_retries: usize,
    /// Delay before the first retry; doubles on each attempt.
    base_delay: StdDuration,
    /// Cap on the delay before jitter.
    max_delay: StdDuration,
}

impl<T> RetryPageSource<T>
where
    T: PageSource,
{
    /// Create a retry wrapper around an existing [`PageSource`].
    ///
    /// # Arguments
    ///
    /// * `inner` - The page source to wrap
    /// * `max_retries` - Retries after the first attempt
    /// * `base_delay` - Delay before the first retry
    ///
    /// The delay is capped at 10 seconds.
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(10),
        }
    }
}

impl<T> fmt::Debug for RetryPageSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPageSource")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> PageSource for RetryPageSource<T>
where
    T: PageSource,
{
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn get_page(&self, url: &Url) -> Result<String> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.get_page(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "get_page() exhausted retries"
                        );
                        return Err(e);
                    }

                    let shift = (attempt - 1).min(16) as u32;
                    let delay = self
                        .base_delay
                        .saturating_mul(1 << shift)
                        .min(self.max_delay);
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "get_page() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
