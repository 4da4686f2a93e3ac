//! Candidate postings and their classification labels.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;
use url::Url;

use crate::utils::resolve_http_link;

/// Maximum grapheme count kept from a candidate title.
pub const MAX_TITLE_GRAPHEMES: usize = 200;

/// Number of title characters used in the per-source dedup key.
pub const DEDUP_TITLE_CHARS: usize = 100;

/// Length of the hex identity fingerprint.
pub const IDENTITY_HEX_LEN: usize = 24;

/// A prospective job posting found on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Absolute http(s) URL of the posting
    pub href: String,

    /// Display title, whitespace-normalized and truncated
    pub title: String,

    /// Extractor that produced this candidate
    pub source_strategy: String,
}

impl Candidate {
    /// Build a candidate from an already absolute URL.
    ///
    /// Returns `None` unless the URL uses http or https.
    pub fn new(href: &Url, title: &str, source_strategy: impl Into<String>) -> Option<Self> {
        if !matches!(href.scheme(), "http" | "https") {
            return None;
        }
        Some(Self {
            href: href.to_string(),
            title: normalize_title(title),
            source_strategy: source_strategy.into(),
        })
    }

    /// Resolve `href` against the page URL and build a candidate.
    pub fn from_link(
        base: &Url,
        href: &str,
        title: &str,
        source_strategy: impl Into<String>,
    ) -> Option<Self> {
        let resolved = resolve_http_link(base, href)?;
        Self::new(&resolved, title, source_strategy)
    }

    /// Key used to collapse duplicates within one source.
    pub fn dedup_key(&self) -> String {
        let prefix: String = self.title.chars().take(DEDUP_TITLE_CHARS).collect();
        format!("{}|{}", self.href, prefix)
    }

    /// Stable identity used by the novelty state.
    pub fn identity(&self) -> CandidateId {
        CandidateId::of(&self.href, &self.title)
    }
}

/// Collapse whitespace and cap the title length.
pub fn normalize_title(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.graphemes(true).count() <= MAX_TITLE_GRAPHEMES {
        return collapsed;
    }
    collapsed
        .graphemes(true)
        .take(MAX_TITLE_GRAPHEMES)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Content-derived fingerprint of `(href, title)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    /// First 24 hex chars of `sha256(href + "|" + title)`.
    pub fn of(href: &str, title: &str) -> Self {
        let digest = Sha256::digest(format!("{href}|{title}").as_bytes());
        let mut hex = hex::encode(digest);
        hex.truncate(IDENTITY_HEX_LEN);
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mutually exclusive classification labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    /// Physician-grade role in the target specialty
    PhysicianRole,
    /// Other role in or near the specialty
    RelatedRole,
    /// Noise or too short to be a posting
    Excluded,
    /// Matches nothing
    Irrelevant,
}

impl Classification {
    /// Report priority; `None` for labels that never reach the report.
    pub fn priority(self) -> Option<u8> {
        match self {
            Self::PhysicianRole => Some(0),
            Self::RelatedRole => Some(1),
            Self::Excluded | Self::Irrelevant => None,
        }
    }

    /// Whether the label is reported and tracked for novelty.
    pub fn is_reportable(self) -> bool {
        self.priority().is_some()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PhysicianRole => "PHYSICIAN_ROLE",
            Self::RelatedRole => "RELATED_ROLE",
            Self::Excluded => "EXCLUDED",
            Self::Irrelevant => "IRRELEVANT",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://klinik.test/karriere/index.html").unwrap()
    }

    #[test]
    fn test_from_link_resolves_relative() {
        let c = Candidate::from_link(&base(), "stellen/42", "Oberarzt KJPP", "links").unwrap();
        assert_eq!(c.href, "https://klinik.test/karriere/stellen/42");
    }

    #[test]
    fn test_from_link_rejects_non_http() {
        assert!(Candidate::from_link(&base(), "mailto:hr@klinik.test", "Mail", "links").is_none());
        assert!(Candidate::from_link(&base(), "javascript:void(0)", "x", "links").is_none());
        assert!(Candidate::from_link(&base(), "#top", "x", "links").is_none());
    }

    #[test]
    fn test_title_whitespace_is_normalized() {
        let c = Candidate::from_link(&base(), "/a", "  Assistenzarzt \n\t (m/w/d) ", "links").unwrap();
        assert_eq!(c.title, "Assistenzarzt (m/w/d)");
    }

    #[test]
    fn test_title_is_truncated() {
        let long = "ä".repeat(MAX_TITLE_GRAPHEMES + 50);
        assert_eq!(normalize_title(&long).chars().count(), MAX_TITLE_GRAPHEMES);
    }

    #[test]
    fn test_identity_is_24_hex() {
        let id = CandidateId::of("https://x.test/jobs/1", "Facharzt");
        assert_eq!(id.as_str().len(), IDENTITY_HEX_LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_identity_changes_with_title() {
        let a = CandidateId::of("https://x.test/jobs/1", "Facharzt KJPP");
        let b = CandidateId::of("https://x.test/jobs/1", "Oberarzt KJPP");
        assert_ne!(a, b);
        assert_eq!(a, CandidateId::of("https://x.test/jobs/1", "Facharzt KJPP"));
    }

    #[test]
    fn test_dedup_key_uses_title_prefix() {
        let mut a = Candidate::from_link(&base(), "/a", &"x".repeat(150), "links").unwrap();
        let b = a.clone();
        a.title.push_str("tail");
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_priorities() {
        assert_eq!(Classification::PhysicianRole.priority(), Some(0));
        assert_eq!(Classification::RelatedRole.priority(), Some(1));
        assert!(!Classification::Excluded.is_reportable());
        assert!(!Classification::Irrelevant.is_reportable());
    }
}
