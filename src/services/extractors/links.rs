//! Link-based extraction.

use std::sync::Arc;

use scraper::{Html, Selector};
use url::Url;

use super::{Extraction, Extractor, element_text, parse_selector, visible_text};
use crate::error::Result;
use crate::models::{Candidate, ExtractionConfig};
use crate::services::Taxonomy;
use crate::utils::path_and_query;

/// Title of the whole-page fallback candidate.
pub const PAGE_HINT_TITLE: &str = "Hinweis: Keywords auf Seite gefunden";

/// Scans every hyperlink for job-related targets or keyword anchor text.
pub struct LinkExtractor {
    taxonomy: Arc<Taxonomy>,
    path_hints: Vec<String>,
    blocked_words: Vec<String>,
    anchors: Selector,
}

impl LinkExtractor {
    pub fn new(taxonomy: Arc<Taxonomy>, config: &ExtractionConfig) -> Result<Self> {
        Ok(Self {
            taxonomy,
            path_hints: lowercase(&config.job_path_hints),
            blocked_words: lowercase(&config.blocked_path_words),
            anchors: parse_selector("a[href]")?,
        })
    }

    fn is_blocked(&self, target: &str) -> bool {
        self.blocked_words.iter().any(|w| target.contains(w.as_str()))
    }

    fn has_path_hint(&self, target: &str) -> bool {
        self.path_hints.iter().any(|h| target.contains(h.as_str()))
    }
}

impl Extractor for LinkExtractor {
    fn name(&self) -> &'static str {
        "links"
    }

    fn extract(&self, document: &Html, base_url: &Url) -> Extraction {
        let mut out = Extraction::default();

        for anchor in document.select(&self.anchors) {
            let Some(raw) = anchor.value().attr("href") else {
                continue;
            };
            let text = element_text(&anchor);
            let Some(candidate) = Candidate::from_link(base_url, raw, &text, self.name()) else {
                continue;
            };
            let Ok(target) = Url::parse(&candidate.href) else {
                continue;
            };
            let location = path_and_query(&target);
            if self.is_blocked(&location) {
                continue;
            }
            if !self.has_path_hint(&location) && !self.taxonomy.keywords.is_match(&text) {
                continue;
            }
            if candidate.title.is_empty() {
                out.push(Candidate::new(&target, &candidate.href, self.name()));
            } else {
                out.push(Some(candidate));
            }
        }

        let page_text = visible_text(document);
        if let Some(keyword) = self.taxonomy.find_keyword(&page_text) {
            let title = format!("{PAGE_HINT_TITLE} ({})", keyword.to_lowercase());
            out.push(Candidate::new(base_url, &title, self.name()));
        }

        out
    }
}

fn lowercase(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}
