//! Orders date groups by how close they are to "now".
//!
//! Listing headers use a single date format, `%a, %d %b %Y`
//! (e.g. `Mon, 01 Jan 2024`). A header that does not parse fails the whole
//! cycle with [`ScraperError::DateFormat`].

use crate::error::{Result, ScraperError};
use crate::models::{DateGroup, RankedGroup};
use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::debug;

/// Format of listing date headers.
pub const LISTING_DATE_FORMAT: &str = "%a, %d %b %Y";

/// Parse a listing header label into a calendar date.
pub fn parse_listing_date(label: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(label.trim(), LISTING_DATE_FORMAT).map_err(|source| {
        ScraperError::DateFormat {
            label: label.to_string(),
            source,
        }
    })
}

/// Rank `groups` by absolute distance from the current local time and keep
/// the closest `limit`.
///
/// Groups equally far from now keep their page order.
///
/// # Errors
///
/// [`ScraperError::DateFormat`] if any label does not match
/// [`LISTING_DATE_FORMAT`], even one that would have been cut by `limit`.
pub fn rank_and_bound(groups: Vec<DateGroup>, limit: usize) -> Result<Vec<RankedGroup>> {
    rank_and_bound_at(groups, limit, Local::now().naive_local())
}

/// [`rank_and_bound`] against an explicit "now".
///
/// Ties keep page order. Item sets pass through untouched.
pub fn rank_and_bound_at(
    groups: Vec<DateGroup>,
    limit: usize,
    now: NaiveDateTime,
) -> Result<Vec<RankedGroup>> {
    let mut ranked = groups
        .into_iter()
        .map(|group| {
            parse_listing_date(&group.label).map(|date| RankedGroup { date, group })
        })
        .collect::<Result<Vec<_>>>()?;

    ranked.sort_by_key(|r| (now - r.date.and_time(chrono::NaiveTime::MIN)).abs());
    ranked.truncate(limit);

    debug!(
        kept = ranked.len(),
        labels = ?ranked.iter().map(|r| r.group.label.as_str()).collect::<Vec<_>>(),
        "Ranked date groups"
    );
    Ok(ranked)
}
