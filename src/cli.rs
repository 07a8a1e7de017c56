//! Command-line interface definitions for arxiv_watch.
//!
//! All arguments can be provided via command-line flags or environment variables.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the arxiv_watch poller.
///
/// # Examples
///
/// ```sh
/// # Poll every 30 seconds with the defaults
/// arxiv_watch
///
/// # Single cycle, more aggressive limits
/// arxiv_watch --once --pdf-limit 20 --max-concurrency 8
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// JSON file holding the listing page URL (`baseUrl`)
    #[arg(short, long, env = "ARXIV_WATCH_SELECTORS", default_value = "selectors.json")]
    pub selectors: PathBuf,

    /// Newline-delimited file of identifiers already seen
    #[arg(long, env = "ARXIV_WATCH_HISTORY", default_value = "history_file.txt")]
    pub history_file: PathBuf,

    /// Directory downloaded PDFs are written to
    #[arg(short, long, env = "ARXIV_WATCH_OUTPUT_DIR", default_value = "pdfs")]
    pub output_dir: PathBuf,

    /// Seconds to sleep between cycles
    #[arg(long, env = "ARXIV_WATCH_INTERVAL", default_value_t = 30)]
    pub interval_secs: u64,

    /// Seconds to wait after a cycle before reporting its results
    #[arg(long, env = "ARXIV_WATCH_SETTLE", default_value_t = 5)]
    pub settle_secs: u64,

    /// Maximum simultaneous PDF downloads
    #[arg(long, env = "ARXIV_WATCH_MAX_CONCURRENCY", default_value_t = 5,
          value_parser = clap::value_parser!(u16).range(1..))]
    pub max_concurrency: u16,

    /// Number of most recent date groups to consider
    #[arg(long, env = "ARXIV_WATCH_DAYS_LIMIT", default_value_t = 2)]
    pub days_limit: usize,

    /// Maximum PDFs queued per cycle
    #[arg(long, env = "ARXIV_WATCH_PDF_LIMIT", default_value_t = 5)]
    pub pdf_limit: usize,

    /// Per-request timeout for every HTTP call
    #[arg(long, env = "ARXIV_WATCH_TIMEOUT", default_value_t = 60)]
    pub timeout_secs: u64,

    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["arxiv_watch"]);

        assert_eq!(cli.selectors, PathBuf::from("selectors.json"));
        assert_eq!(cli.history_file, PathBuf::from("history_file.txt"));
        assert_eq!(cli.output_dir, PathBuf::from("pdfs"));
        assert_eq!(cli.interval_secs, 30);
        assert_eq!(cli.max_concurrency, 5);
        assert_eq!(cli.days_limit, 2);
        assert_eq!(cli.pdf_limit, 5);
        assert!(!cli.once);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "arxiv_watch",
            "-s",
            "/etc/arxiv/selectors.json",
            "-o",
            "/tmp/pdfs",
            "--pdf-limit",
            "10",
            "--max-concurrency",
            "2",
            "--once",
        ]);

        assert_eq!(cli.selectors, PathBuf::from("/etc/arxiv/selectors.json"));
        assert_eq!(cli.output_dir, PathBuf::from("/tmp/pdfs"));
        assert_eq!(cli.pdf_limit, 10);
        assert_eq!(cli.max_concurrency, 2);
        assert!(cli.once);
    }

    #[test]
    fn test_cli_rejects_zero_concurrency() {
        let result = Cli::try_parse_from(["arxiv_watch", "--max-concurrency", "0"]);
        assert!(result.is_err());
    }
}
