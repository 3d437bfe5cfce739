use crate::filter::{CrawlTarget, ScopePolicy};
use crate::normalize::{normalize, normalize_absolute};
use crate::result::{FetchResult, PageRecord};
use crate::significance::{DEFAULT_MINIMUM_WORDS, is_substantial};
use scraper::{Html, Node};
use tracing::debug;

/// Elements whose text never reaches the page record.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Links and text pulled from one fetched page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageExtraction {
    /// Admitted links in document order, duplicates kept.
    pub links: Vec<CrawlTarget>,
    /// Present only when the page text passed the significance check.
    pub record: Option<PageRecord>,
}

impl PageExtraction {
    pub fn link_strings(&self) -> Vec<String> {
        self.links.iter().map(|l| l.as_str().to_string()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct LinkExtractor {
    policy: ScopePolicy,
    minimum_words: usize,
}

impl LinkExtractor {
    pub fn new() -> Self {
        Self {
            policy: ScopePolicy::uci(),
            minimum_words: DEFAULT_MINIMUM_WORDS,
        }
    }

    pub fn with_policy(mut self, policy: ScopePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_minimum_words(mut self, minimum_words: usize) -> Self {
        self.minimum_words = minimum_words;
        self
    }

    pub fn policy(&self) -> &ScopePolicy {
        &self.policy
    }

    pub fn extract(&self, base_url: &str, fetch: &FetchResult) -> PageExtraction {
        if !fetch.is_processable() {
            debug!(
                "Not extracting {} (status {}, error {:?})",
                base_url, fetch.status, fetch.error
            );
            return PageExtraction::default();
        }
        let Some(content) = fetch.content.as_deref() else {
            return PageExtraction::default();
        };
        let base = match normalize_absolute(base_url) {
            Ok(base) => base,
            Err(e) => {
                debug!("Cannot use {} as a base: {}", base_url, e);
                return PageExtraction::default();
            }
        };

        let document = Html::parse_document(content);
        let mut links = Vec::new();
        let mut text_parts = Vec::new();

        for node in document.root_element().descendants() {
            match node.value() {
                Node::Element(element) if element.name() == "a" => {
                    let Some(href) = element.attr("href") else {
                        continue;
                    };
                    match normalize(base.as_str(), href) {
                        Ok(url) => {
                            if let Ok(target) = self.policy.admit(url) {
                                links.push(target);
                            }
                        }
                        Err(e) => debug!("Skipping link {:?}: {}", href, e),
                    }
                }
                Node::Text(text) => {
                    let hidden = node.ancestors().any(|ancestor| {
                        ancestor
                            .value()
                            .as_element()
                            .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
                    });
                    let trimmed = text.trim();
                    if !hidden && !trimmed.is_empty() {
                        text_parts.push(trimmed);
                    }
                }
                _ => {}
            }
        }

        let text = text_parts.join(" ");
        let record = is_substantial(&text, self.minimum_words).then(|| PageRecord {
            url: base.to_string(),
            text,
        });

        debug!(
            "Extracted {} links from {} (record: {})",
            links.len(),
            base,
            record.is_some()
        );
        PageExtraction { links, record }
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Admitted outbound links of `fetch` under the default policy.
pub fn extract_links(base_url: &str, fetch: &FetchResult) -> Vec<CrawlTarget> {
    LinkExtractor::new().extract(base_url, fetch).links
}
