// Tests for report aggregation

use std::fs;
use tempfile::TempDir;
use zotcrawl_core::CoreError;
use zotcrawl_core::data::{MemoryPageStore, PageStore, SqlitePageStore};
use zotcrawl_core::fetchlog::FetchLog;
use zotcrawl_core::lexicon::{StopWords, WordList};
use zotcrawl_core::report::{
    LongestPage, ReportFormat, ReportOptions, SubdomainCount, WordCount, gather_report_data,
    generate_json_report, generate_text_report, longest_page, save_report, subdomain_counts,
    top_words, unique_download_count,
};

fn log_line(outcome: &str, url: &str) -> String {
    format!(
        "2024-04-30 12:00:00,000 - Worker-0 - INFO - {} {}, status 200.\n",
        outcome, url
    )
}

fn repeat(word: &str, n: usize) -> String {
    vec![word; n].join(" ")
}

fn lexicon() -> WordList {
    WordList::from_words(["the", "crawler", "domain", "anteater", "page", "zot"])
}

fn stop_words() -> StopWords {
    StopWords::from_words(["the", "a", "of"])
}

// ============================================================================
// Unique Page Tests
// ============================================================================

#[test]
fn test_unique_download_count_counts_only_downloaded() {
    let content = [
        log_line("Downloaded", "https://www.ics.uci.edu/a"),
        log_line("Skipped", "https://www.ics.uci.edu/b"),
        log_line("Error", "https://www.ics.uci.edu/c"),
        log_line("Downloaded", "https://www.ics.uci.edu/d"),
    ]
    .concat();
    let log = FetchLog::parse(&content).unwrap();
    assert_eq!(unique_download_count(&log), 2);
}

#[test]
fn test_unique_download_count_empty_log() {
    let log = FetchLog::parse("").unwrap();
    assert_eq!(unique_download_count(&log), 0);
}

// ============================================================================
// Top Words Tests
// ============================================================================

#[test]
fn test_top_words_excludes_stop_words_and_unknown_words() {
    let store = MemoryPageStore::new();
    store
        .put(
            "https://www.ics.uci.edu/a",
            &format!("{} {} {}", repeat("the", 30), repeat("crawler", 6), repeat("xk9q", 5)),
        )
        .unwrap();
    store
        .put(
            "https://www.ics.uci.edu/b",
            &format!(
                "{} {} {} {}",
                repeat("the", 20),
                repeat("Crawler,", 4),
                repeat("domain.", 8),
                repeat("anteater", 3)
            ),
        )
        .unwrap();

    let words = top_words(&store, 3, &lexicon(), &stop_words()).unwrap();
    assert_eq!(
        words,
        vec![
            WordCount { word: "crawler".to_string(), count: 10 },
            WordCount { word: "domain".to_string(), count: 8 },
            WordCount { word: "anteater".to_string(), count: 3 },
        ]
    );
}

#[test]
fn test_top_words_splits_on_dashes() {
    let store = MemoryPageStore::new();
    store
        .put("https://www.ics.uci.edu/", "zot-zot\u{2013}page\u{2010}crawler")
        .unwrap();

    let words = top_words(&store, 10, &lexicon(), &stop_words()).unwrap();
    assert_eq!(words[0], WordCount { word: "zot".to_string(), count: 2 });
    assert_eq!(words.len(), 3);
}

#[test]
fn test_top_words_fewer_than_requested() {
    let store = MemoryPageStore::new();
    store.put("https://www.ics.uci.edu/", "page").unwrap();
    let words = top_words(&store, 50, &lexicon(), &stop_words()).unwrap();
    assert_eq!(words.len(), 1);
}

// ============================================================================
// Longest Page Tests
// ============================================================================

#[test]
fn test_longest_page_picks_most_words() {
    let store = MemoryPageStore::new();
    store.put("https://www.ics.uci.edu/short", &repeat("word", 500)).unwrap();
    store.put("https://www.ics.uci.edu/long", &repeat("word", 1500)).unwrap();

    assert_eq!(
        longest_page(&store).unwrap(),
        Some(LongestPage {
            url: "https://www.ics.uci.edu/long".to_string(),
            word_count: 1500
        })
    );
}

#[test]
fn test_longest_page_tie_goes_to_first() {
    let store = MemoryPageStore::new();
    store.put("https://www.ics.uci.edu/first", &repeat("word", 10)).unwrap();
    store.put("https://www.ics.uci.edu/second", &repeat("word", 10)).unwrap();

    let longest = longest_page(&store).unwrap().unwrap();
    assert_eq!(longest.url, "https://www.ics.uci.edu/first");
}

#[test]
fn test_longest_page_empty_store() {
    assert_eq!(longest_page(&MemoryPageStore::new()).unwrap(), None);
}

// ============================================================================
// Subdomain Tests
// ============================================================================

#[test]
fn test_subdomain_counts_exclude_www() {
    let content = [
        log_line("Downloaded", "http://www.ics.uci.edu/a"),
        log_line("Downloaded", "http://cert.ics.uci.edu/b"),
    ]
    .concat();
    let log = FetchLog::parse(&content).unwrap();

    assert_eq!(
        subdomain_counts(&log, "ics.uci.edu"),
        vec![SubdomainCount { subdomain: "cert".to_string(), pages: 1 }]
    );
}

#[test]
fn test_subdomain_counts_distinct_urls_sorted() {
    let content = [
        log_line("Downloaded", "https://vision.ics.uci.edu/"),
        log_line("Downloaded", "https://cert.ics.uci.edu/a"),
        log_line("Downloaded", "https://cert.ics.uci.edu/a"),
        log_line("Downloaded", "https://www.cert.ics.uci.edu/b"),
        log_line("Skipped", "https://archive.ics.uci.edu/"),
        log_line("Downloaded", "https://www.cs.uci.edu/"),
    ]
    .concat();
    let log = FetchLog::parse(&content).unwrap();

    assert_eq!(
        subdomain_counts(&log, "ics.uci.edu"),
        vec![
            SubdomainCount { subdomain: "cert".to_string(), pages: 2 },
            SubdomainCount { subdomain: "vision".to_string(), pages: 1 },
        ]
    );
}

// ============================================================================
// Full Report Tests
// ============================================================================

#[test]
fn test_text_report_layout() {
    let temp_dir = TempDir::new().unwrap();
    let store = SqlitePageStore::new(&temp_dir.path().join("pages.db")).unwrap();
    store
        .put("https://cert.ics.uci.edu/", &format!("{} {}", repeat("crawler", 3), repeat("zot", 2)))
        .unwrap();

    let log = FetchLog::parse(&log_line("Downloaded", "https://cert.ics.uci.edu/")).unwrap();
    let options = ReportOptions { top_words: 2, ..ReportOptions::default() };
    let data = gather_report_data(&log, &store, &lexicon(), &stop_words(), &options).unwrap();
    let report = generate_text_report(&data);

    let expected = "\
The number of unique pages found was: 1

The longest page was \"https://cert.ics.uci.edu/\" with a length of 5

The 2 most common words (and their frequencies) are:
crawler, 3
zot, 2

The subdomains found under ics.uci.edu and the number of unique pages detected for each is:
http://cert.ics.uci.edu, 1
";
    assert_eq!(report, expected);
}

#[test]
fn test_json_report_fields() {
    let store = MemoryPageStore::new();
    store.put("https://cert.ics.uci.edu/", "crawler crawler").unwrap();
    let log = FetchLog::parse(&log_line("Downloaded", "https://cert.ics.uci.edu/")).unwrap();

    let data = gather_report_data(&log, &store, &lexicon(), &stop_words(), &ReportOptions::default())
        .unwrap();
    let json = generate_json_report(&data).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

    let report = &parsed["report"];
    assert_eq!(report["metadata"]["generator"], "zotcrawl");
    assert_eq!(report["summary"]["unique_pages"], 1);
    assert_eq!(report["summary"]["longest_page"]["word_count"], 2);
    assert_eq!(report["top_words"]["words"][0]["word"], "crawler");
    assert_eq!(report["subdomains"]["counts"][0]["subdomain"], "cert");
}

#[test]
fn test_save_report() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.txt");
    save_report("The number of unique pages found was: 0\n", &path).unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "The number of unique pages found was: 0\n"
    );
}

#[test]
fn test_report_format_parsing() {
    assert!(matches!(ReportFormat::from_str("text"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("Json"), Some(ReportFormat::Json)));
    assert!(ReportFormat::from_str("csv").is_none());
}

#[test]
fn test_missing_stop_words_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let result = StopWords::load(&temp_dir.path().join("stop_words.txt"));
    assert!(matches!(result, Err(CoreError::MissingResource { .. })));
}
