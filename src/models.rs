//! Data models shared by the discovery pipeline.
//!
//! - [`DateGroup`]: papers announced under one date header of the listing page
//! - [`Listing`]: everything one listing fetch yields (groups plus titles)
//! - [`RankedGroup`]: a date group with its parsed calendar date
//! - [`DownloadTask`]: one queued PDF download
//! - [`CycleItem`]: what the caller gets back for every queued paper

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

/// A paper identifier: the absolute PDF link it was discovered under.
pub type Identifier = String;

/// Titles keyed by identifier, already sanitized for use in filenames.
pub type Titles = HashMap<Identifier, String>;

/// Papers listed under a single date header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateGroup {
    /// The header text in the source's own format, e.g. `Mon, 01 Jan 2024`.
    pub label: String,
    pub identifiers: BTreeSet<Identifier>,
}

impl DateGroup {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            identifiers: BTreeSet::new(),
        }
    }
}

/// Result of parsing one listing page.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Groups in page order.
    pub groups: Vec<DateGroup>,
    pub titles: Titles,
}

/// A date group whose label has been parsed into a calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedGroup {
    pub date: NaiveDate,
    pub group: DateGroup,
}

impl RankedGroup {
    /// Compact date used in filenames, e.g. `1-1-24`.
    pub fn short_date(&self) -> String {
        self.date.format("%-d-%-m-%y").to_string()
    }
}

/// A single download queued by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub identifier: Identifier,
    pub title: String,
    pub target: PathBuf,
    /// Label of the date group the paper was found under.
    pub group_label: String,
}

/// One queued paper, handed to the notification layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleItem {
    pub file_path: PathBuf,
    pub title: String,
    pub link: String,
}

impl From<&DownloadTask> for CycleItem {
    fn from(task: &DownloadTask) -> Self {
        Self {
            file_path: task.target.clone(),
            title: task.title.clone(),
            link: task.identifier.clone(),
        }
    }
}
