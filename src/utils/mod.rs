//! Utility functions and helpers.

pub mod http;
pub mod url;

use ::url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    base.join(href.trim()).ok()
}

/// Resolve a link target, keeping only real http(s) destinations.
///
/// Empty, fragment-only and `javascript:` targets yield `None`.
pub fn resolve_http_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.to_lowercase().starts_with("javascript:") {
        return None;
    }
    resolve_url(base, href).filter(|u| matches!(u.scheme(), "http" | "https"))
}

/// Lowercased path plus query of `url`, without scheme or host.
pub fn path_and_query(url: &Url) -> String {
    let mut target = url.path().to_lowercase();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(&query.to_lowercase());
    }
    target
}
