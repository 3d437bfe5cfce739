use crate::data::PageStore;
use crate::error::Result;
use crate::fetchlog::FetchLogWriter;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};
use url::Url;
use zotcrawl_scanner::result::CrawlResult;
use zotcrawl_scanner::{Crawler, FetchOutcome, PageRecord, ScopePolicy};

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub seeds: Vec<String>,
    pub threads: usize,
    pub max_depth: usize,
    pub max_pages: Option<usize>,
    pub minimum_words: usize,
    pub timeout: u64,
    pub policy: ScopePolicy,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            threads: 10,
            max_depth: 3,
            max_pages: None,
            minimum_words: zotcrawl_scanner::DEFAULT_MINIMUM_WORDS,
            timeout: 30,
            policy: ScopePolicy::uci(),
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    pub results: Vec<CrawlResult>,
    pub downloaded: usize,
    pub skipped: usize,
    pub errors: usize,
    pub pages_stored: usize,
}

impl CrawlSummary {
    fn from_results(results: Vec<CrawlResult>, pages_stored: usize) -> Self {
        let count = |outcome: FetchOutcome| results.iter().filter(|r| r.outcome == outcome).count();
        Self {
            downloaded: count(FetchOutcome::Downloaded),
            skipped: count(FetchOutcome::Skipped),
            errors: count(FetchOutcome::Error),
            pages_stored,
            results,
        }
    }
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Run the crawler, persisting admitted pages into `store` and one log line
/// per dequeued URL into `log`.
pub async fn execute_crawl(
    options: CrawlOptions,
    store: Arc<dyn PageStore>,
    log: Arc<FetchLogWriter>,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlSummary> {
    let CrawlOptions {
        seeds,
        threads,
        max_depth,
        max_pages,
        minimum_words,
        timeout,
        policy,
        show_progress_bars,
    } = options;

    // Out-of-scope seeds are reported and dropped; the crawler rejects the
    // whole run if none survive.
    let (admitted, rejected): (Vec<String>, Vec<String>) = seeds
        .into_iter()
        .partition(|seed| policy.classify_str(seed).is_admit());
    for seed in &rejected {
        let verdict = policy.classify_str(seed);
        warn!("Dropping seed {}: {}", seed, verdict);
        if let Some(ref callback) = progress_callback {
            callback(format!("[!]  Skipping seed {} ({})", seed, verdict));
        }
    }
    let seeds = if admitted.is_empty() { rejected } else { admitted };

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));
    let stored_count = Arc::new(AtomicUsize::new(0));

    let internal_progress_callback: zotcrawl_scanner::ProgressCallback = match progress_bar.clone() {
        Some(pb) => {
            let count_clone = processed_count.clone();
            Arc::new(move |_worker_id: usize, url: String| {
                let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
                pb.set_message(format!("Crawling... {} URLs processed ({})", count, url));
                pb.tick();
            })
        }
        None => {
            let count_clone = processed_count.clone();
            Arc::new(move |_worker_id: usize, _url: String| {
                count_clone.fetch_add(1, Ordering::Relaxed);
            })
        }
    };

    let log_clone = log.clone();
    let result_callback: zotcrawl_scanner::ResultCallback = Arc::new(move |result: CrawlResult| {
        log_clone.record(&result);
    });

    let store_clone = store.clone();
    let stored_clone = stored_count.clone();
    let page_callback: zotcrawl_scanner::PageCallback = Arc::new(move |record: PageRecord| {
        match store_clone.put_record(&record) {
            Ok(()) => {
                stored_clone.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => warn!("Failed to store page {}: {}", record.url, e),
        }
    });

    let mut crawler = Crawler::with_timeout(timeout)
        .with_max_depth(max_depth)
        .with_policy(policy)
        .with_minimum_words(minimum_words)
        .with_progress_callback(internal_progress_callback)
        .with_result_callback(result_callback)
        .with_page_callback(page_callback);
    if let Some(max_pages) = max_pages {
        crawler = crawler.with_max_pages(max_pages);
    }

    if let Some(ref callback) = progress_callback {
        callback(format!("Crawling {} seed(s) with {} workers", seeds.len(), threads));
    }

    let outcome = crawler.crawl(&seeds, threads).await;

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} URLs processed", total));
    }

    let summary = CrawlSummary::from_results(outcome?, stored_count.load(Ordering::Relaxed));
    info!(
        "Crawl finished: {} downloaded, {} skipped, {} errors, {} pages stored",
        summary.downloaded, summary.skipped, summary.errors, summary.pages_stored
    );
    Ok(summary)
}

/// Generate a crawl report from results
pub fn generate_crawl_report(summary: &CrawlSummary) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  URLs processed: {}\n", summary.results.len()));
    report.push_str(&format!("  Downloaded: {}\n", summary.downloaded));
    report.push_str(&format!("  Skipped: {}\n", summary.skipped));
    report.push_str(&format!("  Errors: {}\n", summary.errors));
    report.push_str(&format!("  Pages stored: {}\n", summary.pages_stored));

    let total_links: usize = summary.results.iter().map(|r| r.links_found.len()).sum();
    report.push_str(&format!("  Total links found: {}\n", total_links));

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    let mut by_host: BTreeMap<String, Vec<&CrawlResult>> = BTreeMap::new();
    for result in summary
        .results
        .iter()
        .filter(|r| r.outcome == FetchOutcome::Downloaded)
    {
        if let Ok(url) = Url::parse(&result.url)
            && let Some(host) = url.host_str()
        {
            by_host.entry(host.to_string()).or_default().push(result);
        }
    }

    for (host, host_results) in by_host.iter() {
        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} pages downloaded\n\n", host_results.len()));

        for result in host_results {
            let path = extract_url_path(&result.url);

            let status_str = match result.status_code {
                200..=299 => format!("\x1b[32m{}\x1b[0m", result.status_code), // Green
                300..=399 => format!("\x1b[36m{}\x1b[0m", result.status_code), // Cyan
                400..=499 => format!("\x1b[33m{}\x1b[0m", result.status_code), // Yellow
                500..=599 => format!("\x1b[31m{}\x1b[0m", result.status_code), // Red
                _ => format!("{}", result.status_code),
            };

            let mut line = format!("  {} {}", status_str, path);
            if result.page_stored {
                line.push_str(" \x1b[90m[stored]\x1b[0m");
            }
            if let Some(ref content_type) = result.content_type
                && !content_type.starts_with("text/html")
            {
                line.push_str(&format!(" \x1b[90m{}\x1b[0m", content_type));
            }

            report.push_str(&line);
            report.push('\n');
        }
        report.push('\n');
    }

    report
}
