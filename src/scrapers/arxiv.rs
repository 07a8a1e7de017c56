//! arXiv listing page scraper.
//!
//! A listing page (e.g. `https://arxiv.org/list/cs.AI/pastweek`) is a run of
//! `<h3>` date headers, each followed by `<dt>`/`<dd>` entry pairs:
//!
//! ```html
//! <h3>Mon, 1 Jan 2024 (showing 2 of 2 entries)</h3>
//! <dl>
//!   <dt><span class="list-identifier">
//!     <a href="/abs/2401.00001" title="Abstract">arXiv:2401.00001</a>
//!     [<a href="/pdf/2401.00001" title="Download PDF">pdf</a>]
//!   </span></dt>
//!   <dd><div class="list-title mathjax"><span class="descriptor">Title:</span> A Paper</div></dd>
//! </dl>
//! ```
//!
//! Entries belong to the nearest preceding header. The PDF link resolved
//! against the listing URL, with `.pdf` appended, is the paper's identifier.

use crate::error::{Result, ScraperError};
use crate::models::{DateGroup, Listing};
use crate::scrapers::source::PageSource;
use crate::utils::{sanitize_title, truncate_for_log};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

static STRUCTURE: Lazy<Selector> = Lazy::new(|| Selector::parse("h3, dt, dd").expect("static selector"));
static PDF_LINK: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"span.list-identifier a[title="Download PDF"]"#).expect("static selector")
});
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("div.list-title").expect("static selector"));
static TRAILING_PAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\([^)]*\)\s*$").expect("static regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Fetch the listing at `url` and group its papers by announcement date.
///
/// # Arguments
///
/// * `source` - Where the page body comes from
/// * `url` - The listing page; relative PDF links are resolved against it
///
/// # Returns
///
/// The date groups in page order plus a title for every identifier.
///
/// # Errors
///
/// Whatever `source` returns for the request, or [`ScraperError::Parse`]
/// for a page without date headers or entries.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_groups<S: PageSource>(source: &S, url: &Url) -> Result<Listing> {
    let html = source.get_page(url).await?;
    debug!(bytes = html.len(), "Fetched listing page");
    let listing = parse_listing(&html, url)?;
    info!(
        groups = listing.groups.len(),
        papers = listing.titles.len(),
        "Parsed listing page"
    );
    Ok(listing)
}

/// Parse a listing page. `base` resolves relative PDF links.
///
/// Fails with [`ScraperError::Parse`] when the page has no date headers or no
/// entries. Individual entries with no PDF link or no title are dropped.
pub fn parse_listing(html: &str, base: &Url) -> Result<Listing> {
    let document = Html::parse_document(html);
    let mut listing = Listing::default();
    let mut current: Option<usize> = None;
    let mut pending_link: Option<String> = None;
    let mut entries_seen = 0usize;

    for element in document.select(&STRUCTURE) {
        match element.value().name() {
            "h3" => {
                drop_unpaired(&mut pending_link, "next date header");
                let label = header_label(&element.text().collect::<String>());
                let index = match listing.groups.iter().position(|g| g.label == label) {
                    Some(index) => index,
                    None => {
                        listing.groups.push(DateGroup::new(label));
                        listing.groups.len() - 1
                    }
                };
                current = Some(index);
            }
            "dt" => {
                entries_seen += 1;
                drop_unpaired(&mut pending_link, "next entry");
                pending_link = pdf_link(element, base);
                if pending_link.is_none() {
                    warn!(
                        entry = %truncate_for_log(&element.text().collect::<String>(), 120),
                        "Entry has no PDF link; dropping"
                    );
                }
            }
            "dd" => {
                let Some(link) = pending_link.take() else {
                    continue;
                };
                let Some(title) = entry_title(element) else {
                    warn!(%link, "Entry has no title; dropping");
                    continue;
                };
                let Some(index) = current else {
                    warn!(%link, "Entry appears before any date header; dropping");
                    continue;
                };
                listing.groups[index].identifiers.insert(link.clone());
                listing.titles.insert(link, title);
            }
            _ => {}
        }
    }
    drop_unpaired(&mut pending_link, "end of page");

    if listing.groups.is_empty() {
        return Err(ScraperError::parse("no date headers (<h3>) found"));
    }
    if entries_seen == 0 {
        return Err(ScraperError::parse("no listing entries (<dt>) found"));
    }
    Ok(listing)
}

fn drop_unpaired(pending_link: &mut Option<String>, reason: &str) {
    if let Some(link) = pending_link.take() {
        warn!(%link, reason, "PDF link has no matching title; dropping");
    }
}

/// Header text with any `(showing N of M entries)` suffix removed.
fn header_label(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text.trim(), " ");
    TRAILING_PAREN.replace(&collapsed, "").trim().to_string()
}

/// Build the identifier for an entry: its PDF link, absolute, ending in `.pdf`.
fn pdf_link(entry: ElementRef<'_>, base: &Url) -> Option<String> {
    let href = entry.select(&PDF_LINK).find_map(|a| a.value().attr("href"))?;
    let resolved = match base.join(href) {
        Ok(url) => url,
        Err(e) => {
            warn!(href, error = %e, "Unresolvable PDF link");
            return None;
        }
    };
    let mut link = resolved.to_string();
    if !link.ends_with(".pdf") {
        link.push_str(".pdf");
    }
    Some(link)
}

fn entry_title(entry: ElementRef<'_>) -> Option<String> {
    let raw = entry.select(&TITLE).next()?.text().collect::<String>();
    let title = sanitize_title(&raw);
    (!title.is_empty()).then_some(title)
}
