//! Single-document downloads.
//!
//! A [`Fetch`] implementation retrieves one URL and writes the full body to a
//! target path. Concurrency limits are the caller's job: the scheduler holds
//! a semaphore permit around every call.

use crate::error::{Result, ScraperError};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, instrument};

/// Downloads one document to disk.
pub trait Fetch {
    /// Retrieve `link` and write the body to `target`, creating parent
    /// directories as needed.
    ///
    /// # Arguments
    ///
    /// * `link` - Absolute URL of the PDF
    /// * `target` - File to create or overwrite
    ///
    /// # Returns
    ///
    /// The number of bytes written.
    ///
    /// # Errors
    ///
    /// [`crate::ScraperError::Network`] for transport failures, timeouts and
    /// non-success statuses. [`crate::ScraperError::Storage`] if the file
    /// cannot be written.
    async fn fetch(&self, link: &str, target: &Path) -> Result<u64>;
}

/// Build the shared HTTP client used for listing pages and PDFs.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ScraperError::config(format!("cannot build HTTP client: {e}")))
}

/// [`Fetch`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Use `client` for every download; its timeout bounds each request.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(%link, target = %target.display()))]
    async fn fetch(&self, link: &str, target: &Path) -> Result<u64> {
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ScraperError::storage(parent, e))?;
        }

        let response = self
            .client
            .get(link)
            .send()
            .await
            .map_err(|e| ScraperError::network(link, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::network(link, format!("HTTP status {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ScraperError::network(link, e))?;
        fs::write(target, &body)
            .await
            .map_err(|e| ScraperError::storage(target, e))?;

        debug!(bytes = body.len(), "Wrote PDF");
        Ok(body.len() as u64)
    }
}
