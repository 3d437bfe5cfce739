use thiserror::Error;
use zotcrawl_scanner::ScanError;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing {kind}: {path}")]
    MissingResource { kind: &'static str, path: String },

    #[error("Malformed fetch log line {line}: expected at least {expected} fields, found {found}")]
    MalformedLogLine {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Crawl failed: {0}")]
    Scan(#[from] ScanError),

    #[error("Page store lock poisoned")]
    LockPoisoned,
}

impl CoreError {
    pub fn missing(kind: &'static str, path: &std::path::Path) -> Self {
        CoreError::MissingResource {
            kind,
            path: path.display().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
