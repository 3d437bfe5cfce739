// Link canonicalization ahead of scope filtering

use crate::error::{Result, ScanError};
use url::Url;

/// Resolve `href` against `base` and drop any fragment.
///
/// Scheme checks are left to the scope filter, so `mailto:` or
/// `javascript:` links normalize fine and are rejected there. An empty
/// link is a reference to the base itself.
pub fn normalize(base: &str, href: &str) -> Result<Url> {
    let href = href.trim();
    let base_url = Url::parse(base)
        .map_err(|e| ScanError::InvalidUrl(format!("base {}: {}", base, e)))?;
    let mut resolved = base_url
        .join(href)
        .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", href, e)))?;

    resolved.set_fragment(None);
    Ok(resolved)
}

/// Normalize an already-absolute URL string.
pub fn normalize_absolute(url: &str) -> Result<Url> {
    let mut parsed = Url::parse(url.trim())
        .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
    parsed.set_fragment(None);
    Ok(parsed)
}
