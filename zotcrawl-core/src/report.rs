// Offline aggregate report over the fetch log and page store

use crate::data::PageStore;
use crate::error::Result;
use crate::fetchlog::FetchLog;
use crate::lexicon::{Lexicon, StopWords};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use url::Url;

pub const DEFAULT_TOP_WORDS: usize = 50;
pub const DEFAULT_PARENT_DOMAIN: &str = "ics.uci.edu";

/// Characters deleted from a token before it is checked.
const STRIPPED_PUNCTUATION: &[char] = &['.', ',', '?', ':', '!', ';', '(', ')', '[', ']', '{', '}', '"'];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub top_words: usize,
    pub parent_domain: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_words: DEFAULT_TOP_WORDS,
            parent_domain: DEFAULT_PARENT_DOMAIN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongestPage {
    pub url: String,
    pub word_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubdomainCount {
    pub subdomain: String,
    pub pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub unique_pages: usize,
    pub stored_pages: usize,
    pub longest_page: Option<LongestPage>,
    pub top_words_requested: usize,
    pub top_words: Vec<WordCount>,
    pub parent_domain: String,
    pub subdomains: Vec<SubdomainCount>,
}

/// Number of `Downloaded` entries. Re-downloads of a URL count again.
pub fn unique_download_count(log: &FetchLog) -> usize {
    log.entries().iter().filter(|e| e.is_download()).count()
}

/// Split on whitespace, ASCII hyphen, U+2010 hyphen and U+2013 en dash.
pub fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || matches!(c, '-' | '\u{2010}' | '\u{2013}'))
        .filter(|piece| !piece.is_empty())
}

pub fn word_count(text: &str) -> usize {
    split_words(text).count()
}

fn strip_punctuation(token: &str) -> String {
    token.chars().filter(|c| !STRIPPED_PUNCTUATION.contains(c)).collect()
}

fn is_word_shaped(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphabetic() || c == '\'')
}

/// Lowercase word -> occurrences over `texts`, keeping only lexicon words
/// that are not stop words.
pub fn word_frequencies<'a, I>(texts: I, lexicon: &dyn Lexicon, stop_words: &StopWords) -> HashMap<String, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut frequencies: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for piece in split_words(text) {
            let token = strip_punctuation(piece);
            if !is_word_shaped(&token) || !lexicon.is_word(&token) {
                continue;
            }
            let lower = token.to_lowercase();
            if stop_words.contains(&lower) {
                continue;
            }
            *frequencies.entry(lower).or_insert(0) += 1;
        }
    }
    frequencies
}

/// The `n` most frequent words across every stored page, by descending count.
/// Equal counts come out alphabetically.
pub fn top_words(
    store: &dyn PageStore,
    n: usize,
    lexicon: &dyn Lexicon,
    stop_words: &StopWords,
) -> Result<Vec<WordCount>> {
    let texts = store.values()?;
    let frequencies = word_frequencies(texts.iter().map(String::as_str), lexicon, stop_words);

    let mut ranked: Vec<WordCount> = frequencies
        .into_iter()
        .map(|(word, count)| WordCount { word, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    ranked.truncate(n);
    Ok(ranked)
}

/// First page in store order with the greatest word count.
pub fn longest_page(store: &dyn PageStore) -> Result<Option<LongestPage>> {
    let mut longest: Option<LongestPage> = None;
    for record in store.records()? {
        let count = word_count(&record.text);
        if longest.as_ref().is_none_or(|l| count > l.word_count) {
            longest = Some(LongestPage {
                url: record.url,
                word_count: count,
            });
        }
    }
    Ok(longest)
}

/// Label of `url`'s host under `parent`, minus any leading `www.`.
///
/// `https://www.cert.ics.uci.edu/` under `ics.uci.edu` is `cert`. The
/// parent itself, `www.<parent>`, hosts outside the parent and unparsable
/// URLs have no label.
pub fn subdomain_label(url: &str, parent: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let parent = parent.trim_matches('.').to_lowercase();

    let label = host.strip_suffix(&parent)?.strip_suffix('.')?;
    let label = label.strip_prefix("www.").unwrap_or(label);
    if label.is_empty() || label == "www" {
        return None;
    }
    Some(label.to_string())
}

/// Distinct downloaded URLs per subdomain label, alphabetical by label.
pub fn subdomain_counts(log: &FetchLog, parent: &str) -> Vec<SubdomainCount> {
    let mut by_label: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
    for url in log.downloaded_urls() {
        if let Some(label) = subdomain_label(url, parent) {
            by_label.entry(label).or_default().insert(url);
        }
    }
    by_label
        .into_iter()
        .map(|(subdomain, urls)| SubdomainCount {
            subdomain,
            pages: urls.len(),
        })
        .collect()
}

pub fn gather_report_data(
    log: &FetchLog,
    store: &dyn PageStore,
    lexicon: &dyn Lexicon,
    stop_words: &StopWords,
    options: &ReportOptions,
) -> Result<ReportData> {
    Ok(ReportData {
        unique_pages: unique_download_count(log),
        stored_pages: store.len()?,
        longest_page: longest_page(store)?,
        top_words_requested: options.top_words,
        top_words: top_words(store, options.top_words, lexicon, stop_words)?,
        parent_domain: options.parent_domain.clone(),
        subdomains: subdomain_counts(log, &options.parent_domain),
    })
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str(&format!(
        "The number of unique pages found was: {}\n",
        data.unique_pages
    ));

    match data.longest_page {
        Some(ref longest) => report.push_str(&format!(
            "\nThe longest page was \"{}\" with a length of {}\n",
            longest.url, longest.word_count
        )),
        None => report.push_str("\nThe longest page was \"\" with a length of 0\n"),
    }

    report.push_str(&format!(
        "\nThe {} most common words (and their frequencies) are:\n",
        data.top_words_requested
    ));
    for entry in &data.top_words {
        report.push_str(&format!("{}, {}\n", entry.word, entry.count));
    }

    report.push_str(&format!(
        "\nThe subdomains found under {} and the number of unique pages detected for each is:\n",
        data.parent_domain
    ));
    for entry in &data.subdomains {
        report.push_str(&format!(
            "http://{}.{}, {}\n",
            entry.subdomain, data.parent_domain, entry.pages
        ));
    }

    report
}

pub fn generate_json_report(data: &ReportData) -> std::result::Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "zotcrawl",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "summary": {
                "unique_pages": data.unique_pages,
                "stored_pages": data.stored_pages,
                "longest_page": data.longest_page,
            },
            "top_words": {
                "requested": data.top_words_requested,
                "words": data.top_words
            },
            "subdomains": {
                "parent_domain": data.parent_domain,
                "counts": data.subdomains
            }
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
