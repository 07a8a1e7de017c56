//! Listing page discovery.
//!
//! Discovery runs in two steps:
//!
//! 1. **Fetching**: [`source`] retrieves the listing page body, retrying
//!    transient failures with backoff
//! 2. **Parsing**: [`arxiv`] groups the page's entries by date header and
//!    derives an identifier and title for each paper

pub mod arxiv;
pub mod source;

pub use arxiv::{fetch_groups, parse_listing};
pub use source::{HttpPageSource, PageSource, RetryPageSource};
