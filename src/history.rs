//! Persistent record of every paper identifier already seen.
//!
//! The history file is plain text, one identifier per line. It is read in full
//! at the start of a cycle and replaced wholesale at the end, via a sibling
//! temp file and a rename so a crash mid-write never truncates it.

use crate::error::{Result, ScraperError};
use crate::models::Identifier;
use itertools::Itertools;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// Set of identifiers seen so far. Only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySet(HashSet<Identifier>);

impl HistorySet {
    /// An empty history, as on the very first run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` has been seen in any earlier cycle.
    ///
    /// # Arguments
    ///
    /// * `id` - Full PDF link, the same form stored in the history file
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Number of distinct identifiers recorded.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Identifiers in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
        self.0.iter()
    }

    /// Union `other` into this set.
    pub fn merge<I>(&mut self, other: I)
    where
        I: IntoIterator<Item = Identifier>,
    {
        self.0.extend(other);
    }

    /// True when every identifier in `other` is also recorded here.
    pub fn is_superset(&self, other: &HistorySet) -> bool {
        self.0.is_superset(&other.0)
    }
}

impl FromIterator<Identifier> for HistorySet {
    fn from_iter<T: IntoIterator<Item = Identifier>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for HistorySet {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

/// File-backed store for a [`HistorySet`].
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Create a store for the history file at `path`.
    ///
    /// Nothing is read or created until [`HistoryStore::load`] or
    /// [`HistoryStore::save`] is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the history. A missing file is an empty history.
    ///
    /// Blank lines and surrounding whitespace are ignored.
    ///
    /// # Errors
    ///
    /// [`ScraperError::Storage`] if the file exists but cannot be read.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<HistorySet> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No history file yet; starting empty");
                return Ok(HistorySet::new());
            }
            Err(e) => return Err(ScraperError::storage(&self.path, e)),
        };

        let history: HistorySet = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        debug!(count = history.len(), "Loaded history");
        Ok(history)
    }

    /// Replace the history file with `history`, sorted for stable diffs.
    ///
    /// The parent directory is created if missing. The new content is written
    /// to `<name>.tmp` and renamed over the old file, so a failed write leaves
    /// the previous history in place.
    ///
    /// # Arguments
    ///
    /// * `history` - The complete set to persist, not a delta
    ///
    /// # Errors
    ///
    /// [`ScraperError::Storage`] naming the path that could not be created,
    /// written or renamed.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display(), count = history.len()))]
    pub async fn save(&self, history: &HistorySet) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ScraperError::storage(parent, e))?;
        }

        let mut body = history.iter().sorted().join("\n");
        if !body.is_empty() {
            body.push('\n');
        }

        let tmp = self.temp_path();
        fs::write(&tmp, body)
            .await
            .map_err(|e| ScraperError::storage(&tmp, e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| ScraperError::storage(&self.path, e))?;
        debug!("Saved history");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "history".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
