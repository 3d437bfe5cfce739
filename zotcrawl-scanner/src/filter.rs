//! URL admission policy.
//!
//! Decides whether a normalized URL may enter the frontier. Checks run in a
//! fixed order and the first failing check names the verdict:
//!
//! 1. scheme is `http` or `https`
//! 2. host is inside the allowed domains (or the one path-scoped host)
//! 3. the URL contains no trap substring
//! 4. the path does not end in a non-HTML extension

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Domains whose host and every dot-bounded subdomain are in scope.
pub const ALLOWED_DOMAINS: &[&str] = &[
    "ics.uci.edu",
    "cs.uci.edu",
    "informatics.uci.edu",
    "stat.uci.edu",
];

/// Hosts that are only in scope below one path prefix.
pub const PATH_SCOPED_HOSTS: &[(&str, &str)] =
    &[("today.uci.edu", "/department/information_computer_sciences")];

/// Matched against the whole lowercased URL. Over-rejection is accepted.
pub const TRAP_SUBSTRINGS: &[&str] = &[
    // calendars and events
    "/calendar",
    "ical=",
    "outlook-ical",
    "tribe-bar-date",
    "tribe_events",
    "eventdisplay",
    "/events/",
    "/event/",
    "/day/",
    // galleries and image dumps
    "/gallery",
    "/pix/",
    "/photos/",
    "/images/",
    "/img_",
    // pagination, sorting and sharing query keys
    "?page=",
    "&page=",
    "/page/",
    "?share=",
    "&share=",
    "?sort=",
    "&sort=",
    "?order=",
    "replytocom",
    // sessions
    "sessionid",
    "jsessionid",
    "phpsessid",
    "?sid=",
    "&sid=",
    // wiki revisions and actions
    "doku.php",
    "?do=",
    "&do=",
    "?rev=",
    "&rev=",
    "?version=",
    "&version=",
    "action=edit",
    "action=diff",
    "action=login",
    "format=txt",
    "precision=second",
    "/timeline",
    // uploads and attachments
    "/wp-content/uploads",
    "/uploads/",
    "/attachment",
    "attachment_id=",
    "/raw-attachment/",
    "/zip-attachment/",
    // CMS administration
    "/wp-admin",
    "/wp-login",
    "/wp-json",
    "/xmlrpc",
    "/trackback",
];

static BLOCKED_EXTENSIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // styles, scripts, images
        "css", "js", "bmp", "gif", "jpg", "jpeg", "ico", "png", "tif", "tiff", "svg", "webp",
        "psd", "thmx",
        // audio and video
        "mid", "mp2", "mp3", "mp4", "wav", "avi", "mov", "mpeg", "mpg", "ram", "m4v", "mkv",
        "ogg", "ogv", "rm", "smil", "wmv", "swf", "wma",
        // documents
        "pdf", "ps", "eps", "tex", "ppt", "pptx", "pps", "doc", "docx", "xls", "xlsx", "odt",
        "ods", "odp", "rtf", "epub", "mso", "names",
        // data
        "data", "dat", "csv", "arff", "cnf", "sql", "json", "xml", "bib", "txt", "log",
        // archives and binaries
        "exe", "bz2", "tar", "tgz", "gz", "zip", "rar", "7z", "msi", "bin", "dmg", "iso", "dll",
        "jar", "apk", "deb", "rpm", "sha1", "class", "war", "img",
    ]
    .into_iter()
    .collect()
});

static UCI_POLICY: LazyLock<ScopePolicy> = LazyLock::new(ScopePolicy::uci);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterVerdict {
    Admit,
    RejectScheme,
    RejectDomain,
    RejectTrap,
    RejectExtension,
}

impl FilterVerdict {
    pub fn is_admit(self) -> bool {
        self == FilterVerdict::Admit
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterVerdict::Admit => "admit",
            FilterVerdict::RejectScheme => "reject-scheme",
            FilterVerdict::RejectDomain => "reject-domain",
            FilterVerdict::RejectTrap => "reject-trap",
            FilterVerdict::RejectExtension => "reject-extension",
        }
    }
}

impl fmt::Display for FilterVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A URL the policy admitted. Always http(s), never carries a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CrawlTarget(Url);

impl CrawlTarget {
    /// Admit `url` under the default UCI policy.
    pub fn admit(url: Url) -> Result<Self, FilterVerdict> {
        UCI_POLICY.admit(url)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<CrawlTarget> for String {
    fn from(target: CrawlTarget) -> Self {
        target.0.into()
    }
}

/// Domain scope for a crawl. Trap and extension tables are shared by
/// every policy; only the admitted hosts vary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePolicy {
    allowed_domains: Vec<String>,
    path_scoped_hosts: Vec<(String, String)>,
}

impl ScopePolicy {
    /// The four ICS-related domains plus the ICS department pages on
    /// today.uci.edu.
    pub fn uci() -> Self {
        let policy = ALLOWED_DOMAINS
            .iter()
            .fold(Self::empty(), |policy, domain| policy.with_allowed_domain(*domain));
        PATH_SCOPED_HOSTS
            .iter()
            .fold(policy, |policy, (host, prefix)| {
                policy.with_path_scoped_host(*host, *prefix)
            })
    }

    /// A policy with no admitted hosts.
    pub fn empty() -> Self {
        Self {
            allowed_domains: Vec::new(),
            path_scoped_hosts: Vec::new(),
        }
    }

    pub fn with_allowed_domain(mut self, domain: impl Into<String>) -> Self {
        self.allowed_domains.push(domain.into().to_ascii_lowercase());
        self
    }

    pub fn with_path_scoped_host(
        mut self,
        host: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        self.path_scoped_hosts
            .push((host.into().to_ascii_lowercase(), prefix.into()));
        self
    }

    pub fn classify(&self, url: &Url) -> FilterVerdict {
        let verdict = self.evaluate(url);
        if !verdict.is_admit() {
            debug!("{} -> {}", url, verdict);
        }
        verdict
    }

    /// Parse and classify a raw string. Unparsable input is a verdict,
    /// never an error.
    pub fn classify_str(&self, raw: &str) -> FilterVerdict {
        match Url::parse(raw.trim()) {
            Ok(url) => self.classify(&url),
            Err(url::ParseError::RelativeUrlWithoutBase) => FilterVerdict::RejectScheme,
            Err(e) => {
                debug!("unparsable URL {:?}: {}", raw, e);
                FilterVerdict::RejectDomain
            }
        }
    }

    pub fn admit(&self, mut url: Url) -> Result<CrawlTarget, FilterVerdict> {
        url.set_fragment(None);
        match self.classify(&url) {
            FilterVerdict::Admit => Ok(CrawlTarget(url)),
            rejected => Err(rejected),
        }
    }

    fn evaluate(&self, url: &Url) -> FilterVerdict {
        if !matches!(url.scheme(), "http" | "https") {
            return FilterVerdict::RejectScheme;
        }

        let Some(host) = url.host_str() else {
            return FilterVerdict::RejectDomain;
        };
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        if !self.host_in_scope(&host, url.path()) {
            return FilterVerdict::RejectDomain;
        }

        let lowered = url.as_str().to_ascii_lowercase();
        if TRAP_SUBSTRINGS.iter().any(|trap| lowered.contains(trap)) {
            return FilterVerdict::RejectTrap;
        }

        if has_blocked_extension(url.path()) {
            return FilterVerdict::RejectExtension;
        }

        FilterVerdict::Admit
    }

    fn host_in_scope(&self, host: &str, path: &str) -> bool {
        let in_domain = self
            .allowed_domains
            .iter()
            .any(|domain| is_within_domain(host, domain));

        in_domain
            || self
                .path_scoped_hosts
                .iter()
                .any(|(scoped, prefix)| host == scoped && path.starts_with(prefix.as_str()))
    }
}

impl Default for ScopePolicy {
    fn default() -> Self {
        Self::uci()
    }
}

/// True when `host` is `domain` itself or a dot-bounded subdomain of it,
/// so `physics.uci.edu` is not inside `ics.uci.edu`.
pub fn is_within_domain(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn has_blocked_extension(path: &str) -> bool {
    let path = path.to_ascii_lowercase();
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| BLOCKED_EXTENSIONS.contains(ext))
}

/// Classify under the default UCI policy.
pub fn classify(url: &Url) -> FilterVerdict {
    UCI_POLICY.classify(url)
}

/// Parse and classify under the default UCI policy.
pub fn classify_str(raw: &str) -> FilterVerdict {
    UCI_POLICY.classify_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(raw: &str) -> FilterVerdict {
        classify_str(raw)
    }

    #[test]
    fn test_in_scope_pages_are_admitted() {
        for raw in [
            "https://www.ics.uci.edu/",
            "http://ics.uci.edu/about/",
            "https://www.cs.uci.edu/faculty",
            "https://vision.ics.uci.edu/papers.html",
            "https://www.informatics.uci.edu/research/",
            "https://www.stat.uci.edu/seminar-series/",
            "https://today.uci.edu/department/information_computer_sciences/news",
        ] {
            assert_eq!(verdict(raw), FilterVerdict::Admit, "{}", raw);
        }
    }

    #[test]
    fn test_scheme_rejection() {
        for raw in [
            "ftp://ftp.ics.uci.edu/pub/",
            "mailto:someone@ics.uci.edu",
            "javascript:void(0)",
            "file:///etc/passwd",
        ] {
            assert_eq!(verdict(raw), FilterVerdict::RejectScheme, "{}", raw);
        }
    }

    #[test]
    fn test_scheme_rejection_wins_over_everything_else() {
        assert_eq!(
            verdict("ftp://www.ics.uci.edu/calendar/file.pdf"),
            FilterVerdict::RejectScheme
        );
    }

    #[test]
    fn test_out_of_scope_hosts_are_rejected() {
        for raw in [
            "https://www.uci.edu/",
            "https://physics.uci.edu/",
            "https://ics.uci.edu.evil.com/",
            "https://example.com/ics.uci.edu",
            "https://today.uci.edu/",
            "https://today.uci.edu/department/engineering/",
        ] {
            assert_eq!(verdict(raw), FilterVerdict::RejectDomain, "{}", raw);
        }
    }

    #[test]
    fn test_host_is_case_insensitive() {
        assert_eq!(verdict("https://WWW.ICS.UCI.EDU/Grad/"), FilterVerdict::Admit);
    }

    #[test]
    fn test_unparsable_urls_are_verdicts() {
        assert_eq!(verdict("not a url"), FilterVerdict::RejectScheme);
        assert_eq!(verdict("/relative/path"), FilterVerdict::RejectScheme);
        assert_eq!(verdict("http://exa mple.com/"), FilterVerdict::RejectDomain);
        assert_eq!(verdict("http://[::1/"), FilterVerdict::RejectDomain);
    }

    #[test]
    fn test_trap_on_valid_domain() {
        for raw in [
            "https://www.ics.uci.edu/calendar/2024/05",
            "https://wics.ics.uci.edu/events/2021-01-01/",
            "https://www.informatics.uci.edu/news/?share=facebook",
            "https://www.ics.uci.edu/~eppstein/pix/album/index.html",
            "https://www.stat.uci.edu/news/page/4/",
            "https://ngs.ics.uci.edu/post?replytocom=123",
            "https://www.ics.uci.edu/wp-content/uploads/report",
            "https://swiki.ics.uci.edu/doku.php/start?do=diff",
            "https://www.cs.uci.edu/wp-admin/options.php",
            "https://www.ics.uci.edu/search?q=x&PAGE=7",
        ] {
            assert_eq!(verdict(raw), FilterVerdict::RejectTrap, "{}", raw);
        }
    }

    #[test]
    fn test_domain_rejection_precedes_trap_rejection() {
        assert_eq!(
            verdict("https://example.com/calendar/2024"),
            FilterVerdict::RejectDomain
        );
    }

    #[test]
    fn test_extension_rejection() {
        for raw in [
            "https://www.ics.uci.edu/~lab/paper.PDF",
            "https://www.ics.uci.edu/static/site.css",
            "https://www.cs.uci.edu/archive.tar.gz",
            "https://www.stat.uci.edu/data/set.csv",
            "https://www.ics.uci.edu/logo.png?v=2",
        ] {
            assert_eq!(verdict(raw), FilterVerdict::RejectExtension, "{}", raw);
        }
    }

    #[test]
    fn test_extension_must_terminate_the_path() {
        assert_eq!(
            verdict("https://www.ics.uci.edu/docs.pdf/overview"),
            FilterVerdict::Admit
        );
        assert_eq!(verdict("https://www.ics.uci.edu/faq.php"), FilterVerdict::Admit);
    }

    #[test]
    fn test_classify_is_idempotent() {
        for raw in [
            "https://www.ics.uci.edu/",
            "https://www.ics.uci.edu/calendar",
            "https://example.com/",
            "ftp://ics.uci.edu/",
        ] {
            assert_eq!(verdict(raw), verdict(raw));
        }
    }

    #[test]
    fn test_missing_host_is_domain_rejection() {
        assert_eq!(verdict("http://"), FilterVerdict::RejectDomain);

        let url = Url::parse("http://localhost/").unwrap();
        assert_eq!(classify(&url), FilterVerdict::RejectDomain);
    }

    #[test]
    fn test_is_within_domain_requires_label_boundary() {
        assert!(is_within_domain("ics.uci.edu", "ics.uci.edu"));
        assert!(is_within_domain("a.b.ics.uci.edu", "ics.uci.edu"));
        assert!(!is_within_domain("physics.uci.edu", "ics.uci.edu"));
        assert!(!is_within_domain("uci.edu", "ics.uci.edu"));
    }

    #[test]
    fn test_custom_policy_admits_extra_domain() {
        let policy = ScopePolicy::empty().with_allowed_domain("127.0.0.1");
        let url = Url::parse("http://127.0.0.1:8080/page1").unwrap();
        assert_eq!(policy.classify(&url), FilterVerdict::Admit);
        assert_eq!(
            policy.classify_str("https://www.ics.uci.edu/"),
            FilterVerdict::RejectDomain
        );
    }

    #[test]
    fn test_custom_policy_path_scoped_host() {
        let policy = ScopePolicy::empty().with_path_scoped_host("News.UCI.edu", "/ics");
        assert_eq!(
            policy.classify_str("https://news.uci.edu/ics/2024/story"),
            FilterVerdict::Admit
        );
        assert_eq!(
            policy.classify_str("https://news.uci.edu/law/story"),
            FilterVerdict::RejectDomain
        );
        assert_eq!(
            policy.classify_str("https://sub.news.uci.edu/ics/"),
            FilterVerdict::RejectDomain
        );
    }

    #[test]
    fn test_admit_strips_fragment_and_returns_target() {
        let url = Url::parse("https://www.ics.uci.edu/grad/#apply").unwrap();
        let target = CrawlTarget::admit(url).unwrap();
        assert_eq!(target.as_str(), "https://www.ics.uci.edu/grad/");

        let rejected = CrawlTarget::admit(Url::parse("https://www.ics.uci.edu/a.zip").unwrap());
        assert_eq!(rejected, Err(FilterVerdict::RejectExtension));
    }
}
