//! # arxiv_watch
//!
//! Polls an arXiv listing page, downloads newly announced papers, and keeps
//! the catalog a chat front-end reads from.
//!
//! ## Architecture
//!
//! Every cycle runs the same pipeline:
//! 1. **History**: load identifiers already seen ([`history`])
//! 2. **Discovery**: fetch the listing and group papers by date ([`scrapers`])
//! 3. **Ranking**: keep the date groups closest to today ([`ranking`])
//! 4. **Downloading**: queue unseen papers under a quota and a concurrency
//!    cap ([`scheduler`], [`fetcher`])
//! 5. **Persistence**: write the grown history back, return what was queued
//!
//! [`poll::PollLoop`] repeats the cycle forever. [`storage`] holds the
//! relational records used by the chat layer.

pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod history;
pub mod models;
pub mod pipeline;
pub mod poll;
pub mod ranking;
pub mod scheduler;
pub mod scrapers;
pub mod storage;
pub mod utils;

pub use error::{Result, ScraperError};
