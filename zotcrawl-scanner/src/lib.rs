pub mod crawler;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod normalize;
pub mod result;
pub mod significance;

pub use crawler::{Crawler, PageCallback, ProgressCallback, ResultCallback};
pub use error::ScanError;
pub use extractor::{LinkExtractor, PageExtraction, extract_links};
pub use filter::{CrawlTarget, FilterVerdict, ScopePolicy, classify, classify_str};
pub use normalize::normalize;
pub use result::{CrawlResult, FetchOutcome, FetchResult, PageRecord};
pub use significance::{DEFAULT_MINIMUM_WORDS, is_substantial};
