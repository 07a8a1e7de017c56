use arxiv_watch::config::SelectorConfig;
use arxiv_watch::fetcher::{HttpFetcher, build_http_client};
use arxiv_watch::history::{HistorySet, HistoryStore};
use arxiv_watch::pipeline::{ArxivScraper, Pipeline};
use arxiv_watch::scheduler::DownloadScheduler;
use arxiv_watch::scrapers::HttpPageSource;
use arxiv_watch::ScraperError;
use httpmock::prelude::*;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const LISTING_PATH: &str = "/list/cs.AI/pastweek";

fn listing_html() -> String {
    r#"<html><body><div id="dlpage">
    <h1>Artificial Intelligence</h1>
    <h3>Mon, 01 Jan 2024 (showing 2 of 2 entries)</h3>
    <dl>
      <dt><a name="item1">[1]</a>
        <span class="list-identifier"><a href="/abs/2401.00001" title="Abstract">arXiv:2401.00001</a>
        [<a href="/pdf/2401.00001" title="Download PDF">pdf</a>]</span></dt>
      <dd><div class="meta">
        <div class="list-title mathjax"><span class="descriptor">Title:</span> T1</div>
      </div></dd>
      <dt><a name="item2">[2]</a>
        <span class="list-identifier"><a href="/abs/2401.00002" title="Abstract">arXiv:2401.00002</a>
        [<a href="/pdf/2401.00002" title="Download PDF">pdf</a>]</span></dt>
      <dd><div class="meta">
        <div class="list-title mathjax"><span class="descriptor">Title:</span> T2</div>
      </div></dd>
    </dl>
    </div></body></html>"#
        .to_string()
}

struct Fixture {
    _tmp: TempDir,
    history: HistoryStore,
    output_dir: std::path::PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let history = HistoryStore::new(tmp.path().join("history_file.txt"));
        let output_dir = tmp.path().join("pdfs");
        Self {
            _tmp: tmp,
            history,
            output_dir,
        }
    }

    fn scraper(
        &self,
        server: &MockServer,
        quota: usize,
    ) -> ArxivScraper<HttpPageSource, HttpFetcher> {
        let client = build_http_client(Duration::from_secs(5)).unwrap();
        let selectors = SelectorConfig::from_json(&format!(
            r#"{{"baseUrl": "{}"}}"#,
            server.url(LISTING_PATH)
        ))
        .unwrap();
        ArxivScraper::new(
            selectors,
            HttpPageSource::new(client.clone()),
            self.history.clone(),
            DownloadScheduler::new(HttpFetcher::new(client), &self.output_dir, 5, quota),
            2,
        )
    }
}

async fn seed_history(store: &HistoryStore, ids: &[String]) {
    let history: HistorySet = ids.iter().cloned().collect();
    store.save(&history).await.unwrap();
}

fn pdf_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|n| n.ends_with(".pdf"))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[tokio::test]
async fn test_cycle_downloads_only_unseen_paper() {
    let server = MockServer::start_async().await;
    let listing = server
        .mock_async(|when, then| {
            when.method(GET).path(LISTING_PATH);
            then.status(200).header("content-type", "text/html").body(listing_html());
        })
        .await;
    let pdf_x = server
        .mock_async(|when, then| {
            when.method(GET).path("/pdf/2401.00001.pdf");
            then.status(200).body("%PDF-X");
        })
        .await;
    let pdf_y = server
        .mock_async(|when, then| {
            when.method(GET).path("/pdf/2401.00002.pdf");
            then.status(200).body("%PDF-Y");
        })
        .await;

    let fixture = Fixture::new();
    let x = server.url("/pdf/2401.00001.pdf");
    let y = server.url("/pdf/2401.00002.pdf");
    seed_history(&fixture.history, &[x.clone()]).await;

    let items = fixture.scraper(&server, 10).run_cycle().await.unwrap();

    listing.assert_async().await;
    pdf_x.assert_hits_async(0).await;
    pdf_y.assert_hits_async(1).await;

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].link, y);
    assert_eq!(items[0].title, "T2");
    assert_eq!(
        items[0].file_path,
        fixture.output_dir.join("2401.00002__1-1-24__T2.pdf")
    );
    assert_eq!(std::fs::read(&items[0].file_path).unwrap(), b"%PDF-Y");

    let history = fixture.history.load().await.unwrap();
    let expected: HistorySet = [x, y].into_iter().collect();
    assert_eq!(history, expected);
}

#[tokio::test]
async fn test_zero_quota_records_history_without_downloading() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(LISTING_PATH);
            then.status(200).body(listing_html());
        })
        .await;
    let pdfs = server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/pdf/");
            then.status(200).body("%PDF");
        })
        .await;

    let fixture = Fixture::new();
    let x = server.url("/pdf/2401.00001.pdf");
    let y = server.url("/pdf/2401.00002.pdf");
    seed_history(&fixture.history, &[x.clone()]).await;

    let items = fixture.scraper(&server, 0).run_cycle().await.unwrap();

    assert!(items.is_empty());
    pdfs.assert_hits_async(0).await;
    let expected: HistorySet = [x, y].into_iter().collect();
    assert_eq!(fixture.history.load().await.unwrap(), expected);
}

#[tokio::test]
async fn test_second_cycle_is_idempotent() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(LISTING_PATH);
            then.status(200).body(listing_html());
        })
        .await;
    let pdfs = server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/pdf/");
            then.status(200).body("%PDF");
        })
        .await;

    let fixture = Fixture::new();
    let scraper = fixture.scraper(&server, 10);

    let first = scraper.run_cycle().await.unwrap();
    let second = scraper.run_cycle().await.unwrap();

    assert_eq!(first.len(), 2);
    assert!(second.is_empty());
    pdfs.assert_hits_async(2).await;
    assert_eq!(pdf_files(&fixture.output_dir).len(), 2);
}

#[tokio::test]
async fn test_failed_download_is_still_recorded() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(LISTING_PATH);
            then.status(200).body(listing_html());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pdf/2401.00001.pdf");
            then.status(503);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pdf/2401.00002.pdf");
            then.status(200).body("%PDF-Y");
        })
        .await;

    let fixture = Fixture::new();
    let items = fixture.scraper(&server, 10).run_cycle().await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(pdf_files(&fixture.output_dir), vec!["2401.00002__1-1-24__T2.pdf"]);
    let history = fixture.history.load().await.unwrap();
    assert!(history.contains(&server.url("/pdf/2401.00001.pdf")));
    assert!(history.contains(&server.url("/pdf/2401.00002.pdf")));
}

#[tokio::test]
async fn test_history_write_failure_is_returned_after_downloads() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(LISTING_PATH);
            then.status(200).body(listing_html());
        })
        .await;
    let pdf_y = server
        .mock_async(|when, then| {
            when.method(GET).path("/pdf/2401.00002.pdf");
            then.status(200).body("%PDF-Y");
        })
        .await;

    let fixture = Fixture::new();
    let x = server.url("/pdf/2401.00001.pdf");
    seed_history(&fixture.history, &[x.clone()]).await;
    // Loading still works, but the atomic replace has nowhere to write.
    std::fs::create_dir(fixture.history.path().with_file_name("history_file.txt.tmp")).unwrap();

    let err = fixture.scraper(&server, 10).run_cycle().await.unwrap_err();

    assert!(matches!(err, ScraperError::Storage { .. }));
    pdf_y.assert_hits_async(1).await;
    assert_eq!(pdf_files(&fixture.output_dir), vec!["2401.00002__1-1-24__T2.pdf"]);
    let history = fixture.history.load().await.unwrap();
    let expected: HistorySet = [x].into_iter().collect();
    assert_eq!(history, expected);
}

#[tokio::test]
async fn test_listing_failure_leaves_history_untouched() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(LISTING_PATH);
            then.status(500);
        })
        .await;

    let fixture = Fixture::new();
    seed_history(&fixture.history, &["https://arxiv.org/pdf/old.pdf".to_string()]).await;

    let err = fixture.scraper(&server, 10).run_cycle().await.unwrap_err();

    assert!(matches!(err, ScraperError::Network { .. }));
    let history = fixture.history.load().await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_unstructured_listing_is_parse_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(LISTING_PATH);
            then.status(200).body("<html><body><p>maintenance</p></body></html>");
        })
        .await;

    let fixture = Fixture::new();
    let err = fixture.scraper(&server, 10).run_cycle().await.unwrap_err();

    assert!(matches!(err, ScraperError::Parse { .. }));
    assert!(!fixture.history.path().exists());
}

#[tokio::test]
async fn test_missing_base_url_fails_before_any_request() {
    let server = MockServer::start_async().await;
    let listing = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(200).body(listing_html());
        })
        .await;

    let err = SelectorConfig::from_json(r#"{"listing": "somewhere"}"#).unwrap_err();

    assert!(matches!(err, ScraperError::Config { .. }));
    listing.assert_hits_async(0).await;
}
