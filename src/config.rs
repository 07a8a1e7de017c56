//! Selector configuration for the listing scraper.
//!
//! The selector file is a small JSON document naming the listing page to
//! poll:
//!
//! ```json
//! { "baseUrl": "https://arxiv.org/list/cs.AI/pastweek?show=25" }
//! ```
//!
//! It is validated once at startup; any problem is a fatal
//! [`ScraperError::Config`].

use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};
use url::Url;

/// Validated selector configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Listing page polled every cycle.
    pub base_url: Url,
}

#[derive(Debug, Deserialize)]
struct RawSelectors {
    #[serde(rename = "baseUrl")]
    base_url: Option<serde_json::Value>,
}

impl SelectorConfig {
    /// Parse and validate selector JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawSelectors = serde_json::from_str(text)
            .map_err(|e| ScraperError::config(format!("selector file is not a JSON object: {e}")))?;

        let base_url = match raw.base_url {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => {
                return Err(ScraperError::config(format!(
                    "`baseUrl` must be a string, found {other}"
                )));
            }
            None => return Err(ScraperError::config("missing required field `baseUrl`")),
        };

        let base_url = Url::parse(base_url.trim())
            .map_err(|e| ScraperError::config(format!("`baseUrl` is not a valid URL: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ScraperError::config(format!(
                "`baseUrl` must be http or https, got {}",
                base_url.scheme()
            )));
        }

        Ok(Self { base_url })
    }

    /// Read and validate the selector file at `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ScraperError::config(format!("cannot read selector file {}: {e}", path.display()))
        })?;
        let config = Self::from_json(&text)?;
        info!(base_url = %config.base_url, "Loaded selector configuration");
        Ok(config)
    }
}
