//! Error taxonomy shared by every stage of the discovery pipeline.
//!
//! Listing and per-paper failures are recoverable: the poll loop logs them and
//! tries again next cycle. [`ScraperError::Config`] is only produced at startup
//! and is fatal to the process.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    /// Transport failure or non-success HTTP status.
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    /// The listing page lacked the date headers or entry blocks we expect.
    #[error("listing page parse error: {message}")]
    Parse { message: String },

    #[error("unparseable date header {label:?}: {source}")]
    DateFormat {
        label: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("storage error at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ScraperError {
    /// Network error for `url`, keeping only the display text of `err`.
    pub fn network(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ScraperError::Network {
            url: url.into(),
            message: err.to_string(),
        }
    }

    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScraperError::Storage {
            path: path.into(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        ScraperError::Config {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        ScraperError::Parse {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
