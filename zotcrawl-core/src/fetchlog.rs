// Line-oriented fetch log shared by the crawler and the report

use crate::error::{CoreError, Result};
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tracing::warn;
use zotcrawl_scanner::{CrawlResult, FetchOutcome};

/// Whitespace token holding the outcome label.
pub const OUTCOME_FIELD: usize = 7;
/// Whitespace token holding the URL on `Downloaded` lines.
pub const URL_FIELD: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchLogEntry {
    /// 1-based line number in the log file.
    pub position: usize,
    pub outcome: FetchOutcome,
    /// Present for `Downloaded` entries.
    pub url: Option<String>,
}

impl FetchLogEntry {
    pub fn is_download(&self) -> bool {
        self.outcome == FetchOutcome::Downloaded
    }
}

#[derive(Debug, Clone, Default)]
pub struct FetchLog {
    entries: Vec<FetchLogEntry>,
}

impl FetchLog {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::missing("fetch log", path));
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut entries = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            let position = idx + 1;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() <= OUTCOME_FIELD {
                return Err(CoreError::MalformedLogLine {
                    line: position,
                    expected: OUTCOME_FIELD + 1,
                    found: tokens.len(),
                });
            }

            let outcome = FetchOutcome::from_label(tokens[OUTCOME_FIELD]);
            let url = if outcome == FetchOutcome::Downloaded {
                let Some(token) = tokens.get(URL_FIELD) else {
                    return Err(CoreError::MalformedLogLine {
                        line: position,
                        expected: URL_FIELD + 1,
                        found: tokens.len(),
                    });
                };
                Some(token.strip_suffix(',').unwrap_or(token).to_string())
            } else {
                None
            };

            entries.push(FetchLogEntry {
                position,
                outcome,
                url,
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[FetchLogEntry] {
        &self.entries
    }

    /// URLs of `Downloaded` entries in log order, repeats kept.
    pub fn downloaded_urls(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.is_download())
            .filter_map(|e| e.url.as_deref())
    }
}

/// Appends one line per crawl result.
pub struct FetchLogWriter {
    file: Mutex<File>,
}

impl FetchLogWriter {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    pub fn format_line(result: &CrawlResult) -> String {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S,%3f");
        let level = match result.outcome {
            FetchOutcome::Error => "ERROR",
            _ => "INFO",
        };
        let mut line = format!(
            "{} - Worker-{} - {} - {} {}, status {}",
            timestamp, result.worker_id, level, result.outcome, result.url, result.status_code
        );
        if let Some(ref error) = result.error {
            line.push_str(&format!(": {}", error.replace('\n', " ")));
        }
        line.push('.');
        line
    }

    pub fn log_result(&self, result: &CrawlResult) -> Result<()> {
        let line = Self::format_line(result);
        let mut file = self.file.lock().map_err(|_| CoreError::LockPoisoned)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Callback-friendly variant; write failures are logged, not raised.
    pub fn record(&self, result: &CrawlResult) {
        if let Err(e) = self.log_result(result) {
            warn!("Failed to write fetch log line for {}: {}", result.url, e);
        }
    }
}
