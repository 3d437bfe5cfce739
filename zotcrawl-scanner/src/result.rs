use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// What the fetch collaborator hands to the link extractor for one URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResult {
    pub url: String,
    /// Transport or protocol failure, if any.
    pub error: Option<String>,
    pub status: u16,
    pub content: Option<String>,
}

impl FetchResult {
    pub fn ok(url: impl Into<String>, status: u16, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            error: None,
            status,
            content: Some(content.into()),
        }
    }

    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            error: Some(error.into()),
            status: 0,
            content: None,
        }
    }

    /// Only error-free 200 responses are processed for links and text.
    pub fn is_processable(&self) -> bool {
        self.error.is_none() && self.status == 200
    }
}

/// Extracted text for one admitted page, keyed by its normalized URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub text: String,
}

/// Outcome label written to the fetch log for every dequeued URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchOutcome {
    Downloaded,
    Skipped,
    Error,
    Other(String),
}

impl FetchOutcome {
    pub fn as_str(&self) -> &str {
        match self {
            FetchOutcome::Downloaded => "Downloaded",
            FetchOutcome::Skipped => "Skipped",
            FetchOutcome::Error => "Error",
            FetchOutcome::Other(label) => label,
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "Downloaded" => FetchOutcome::Downloaded,
            "Skipped" => FetchOutcome::Skipped,
            "Error" => FetchOutcome::Error,
            other => FetchOutcome::Other(other.to_string()),
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub url: String,
    pub worker_id: usize,
    pub depth: usize,
    pub outcome: FetchOutcome,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub response_time: Duration,
    pub links_found: Vec<String>,
    pub page_stored: bool,
    pub error: Option<String>,
}

impl CrawlResult {
    pub fn new(url: String, worker_id: usize, depth: usize) -> Self {
        Self {
            url,
            worker_id,
            depth,
            outcome: FetchOutcome::Downloaded,
            status_code: 0,
            content_type: None,
            content_length: None,
            response_time: Duration::from_secs(0),
            links_found: Vec::new(),
            page_stored: false,
            error: None,
        }
    }

    pub fn with_error(url: String, worker_id: usize, depth: usize, error: String) -> Self {
        Self {
            outcome: FetchOutcome::Error,
            error: Some(error),
            ..Self::new(url, worker_id, depth)
        }
    }

    pub fn skipped(url: String, worker_id: usize, depth: usize) -> Self {
        Self {
            outcome: FetchOutcome::Skipped,
            ..Self::new(url, worker_id, depth)
        }
    }
}
