//! Utility functions for titles, identifiers, logging and the output directory.
//!
//! - Title sanitization so paper titles can be embedded in filenames
//! - Short identifiers derived from PDF links
//! - String truncation for log fields
//! - File system validation for the download directory

use crate::error::{Result, ScraperError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Longest title, in characters, that ends up in a filename.
pub const MAX_TITLE_CHARS: usize = 100;

/// Longest title, in bytes, that ends up in a filename.
///
/// Leaves room for `{id}__{date}__` and `.pdf` under the usual 255-byte
/// filename limit even when every character is multi-byte.
pub const MAX_TITLE_BYTES: usize = 200;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]"#).expect("static regex"));

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (backing off to a char
/// boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Turn a raw listing title into something safe to embed in a filename.
///
/// The `Title:` label is stripped, runs of whitespace collapse to a single
/// `-`, path separators and other reserved characters are dropped, and the
/// result is capped at [`MAX_TITLE_CHARS`] characters and [`MAX_TITLE_BYTES`]
/// bytes, whichever is shorter.
///
/// # Arguments
///
/// * `raw` - Title text as scraped, possibly with its `Title:` descriptor
///
/// # Returns
///
/// A filename-safe title. Never cut in the middle of a character.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(sanitize_title("Title:  Deep   Learning"), "Deep-Learning");
/// assert_eq!(sanitize_title("Title: A/B Testing"), "AB-Testing");
/// ```
pub fn sanitize_title(raw: &str) -> String {
    let stripped = raw.trim().trim_start_matches("Title:").trim();
    let collapsed = WHITESPACE.replace_all(stripped, "-");
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(&collapsed, "");
    let capped: String = cleaned.chars().take(MAX_TITLE_CHARS).collect();
    if capped.len() <= MAX_TITLE_BYTES {
        return capped;
    }
    let mut cut = MAX_TITLE_BYTES;
    while !capped.is_char_boundary(cut) {
        cut -= 1;
    }
    capped[..cut].to_string()
}

/// Last path segment of a PDF link without its `.pdf` suffix.
///
/// `https://arxiv.org/pdf/2401.00001.pdf` becomes `2401.00001`.
pub fn short_identifier(identifier: &str) -> &str {
    let segment = identifier
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(identifier);
    segment.strip_suffix(".pdf").unwrap_or(segment)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
///
/// # Errors
///
/// [`ScraperError::Storage`] if the directory cannot be created or written.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| ScraperError::storage(path, e))?;

    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(ScraperError::storage(probe_path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundary() {
        let s = "é".repeat(10);
        let result = truncate_for_log(&s, 3);
        assert!(result.starts_with('é'));
        assert!(result.contains("(+18 bytes)"));
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("Title: Deep Learning"), "Deep-Learning");
        assert_eq!(
            sanitize_title("  Title:\n   Graph  Neural\tNetworks  "),
            "Graph-Neural-Networks"
        );
        assert_eq!(sanitize_title("Title: A/B Testing: Revisited?"), "AB-Testing-Revisited");
    }

    #[test]
    fn test_sanitize_title_caps_length() {
        let long = format!("Title: {}", "word ".repeat(60));
        let title = sanitize_title(&long);
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
        assert!(!title.contains(' '));
    }

    #[test]
    fn test_sanitize_title_caps_bytes_for_wide_chars() {
        // 100 four-byte characters would be 400 bytes.
        let wide = format!("Title: {}", "𝔸".repeat(150));
        let title = sanitize_title(&wide);
        assert!(title.len() <= MAX_TITLE_BYTES);
        assert_eq!(title.chars().count(), MAX_TITLE_BYTES / 4);

        // Three-byte characters do not divide the budget evenly.
        let cjk = sanitize_title(&"学".repeat(150));
        assert_eq!(cjk.len(), 198);
        assert!(cjk.chars().all(|c| c == '学'));

        let filename = format!("2401.00001v12__31-12-24__{title}.pdf");
        assert!(filename.len() <= 255);
    }

    #[test]
    fn test_short_identifier() {
        assert_eq!(
            short_identifier("https://arxiv.org/pdf/2401.00001.pdf"),
            "2401.00001"
        );
        assert_eq!(short_identifier("https://arxiv.org/pdf/2401.00001v2"), "2401.00001v2");
        assert_eq!(short_identifier("plain"), "plain");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("pdfs");
        ensure_writable_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
        assert!(!dir.join("..__probe_write__").exists());
    }
}
