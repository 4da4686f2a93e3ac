//! Structural (CSS pattern) extraction.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{Extraction, Extractor, element_text, parse_selector, parse_selectors};
use crate::error::Result;
use crate::models::{Candidate, ExtractionConfig};
use crate::utils::{path_and_query, resolve_http_link};

/// Matches posting blocks by class/tag hints, with a keyword link fallback.
pub struct StructuralExtractor {
    blocks: Vec<(String, Selector)>,
    titles: Vec<Selector>,
    anchors: Selector,
    min_block_chars: usize,
    min_title_chars: usize,
    min_fallback_link_chars: usize,
    fallback_terms: Vec<String>,
    blocked_words: Vec<String>,
}

impl StructuralExtractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let blocks = config
            .structural_selectors
            .iter()
            .map(|s| parse_selector(s).map(|sel| (s.clone(), sel)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            blocks,
            titles: parse_selectors(&config.title_selectors)?,
            anchors: parse_selector("a[href]")?,
            min_block_chars: config.min_block_chars,
            min_title_chars: config.min_title_chars,
            min_fallback_link_chars: config.min_fallback_link_chars,
            fallback_terms: config
                .fallback_link_terms
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
            blocked_words: config
                .blocked_path_words
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
        })
    }

    fn block_title(&self, block: &ElementRef<'_>) -> Option<String> {
        let heading = self.titles.iter().find_map(|sel| {
            block
                .select(sel)
                .map(|el| element_text(&el))
                .find(|text| text.chars().count() >= self.min_title_chars)
        });
        heading.or_else(|| {
            let own = element_text(block);
            (own.chars().count() >= self.min_title_chars).then_some(own)
        })
    }

    fn block_link(&self, block: &ElementRef<'_>, base_url: &Url) -> Url {
        block
            .select(&self.anchors)
            .filter_map(|a| a.value().attr("href"))
            .find_map(|href| resolve_http_link(base_url, href))
            .unwrap_or_else(|| base_url.clone())
    }

    fn scan_blocks(&self, document: &Html, base_url: &Url) -> Extraction {
        let mut out = Extraction::default();
        for (pattern, selector) in &self.blocks {
            for block in document.select(selector) {
                let text = element_text(&block);
                if text.chars().count() < self.min_block_chars {
                    continue;
                }
                let Some(title) = self.block_title(&block) else {
                    continue;
                };
                let href = self.block_link(&block, base_url);
                let source = format!("{}[{}]", self.name(), pattern);
                out.push(Candidate::new(&href, &title, source));
            }
        }
        out
    }

    fn scan_links(&self, document: &Html, base_url: &Url) -> Extraction {
        let mut out = Extraction::default();
        for anchor in document.select(&self.anchors) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let text = element_text(&anchor);
            if text.chars().count() < self.min_fallback_link_chars {
                continue;
            }
            let Some(target) = resolve_http_link(base_url, href) else {
                continue;
            };
            let location = path_and_query(&target);
            let text_lower = text.to_lowercase();
            if self
                .blocked_words
                .iter()
                .any(|w| location.contains(w.as_str()) || text_lower.contains(w.as_str()))
            {
                continue;
            }
            if self.fallback_terms.iter().any(|t| text_lower.contains(t.as_str())) {
                out.push(Candidate::from_link(
                    base_url,
                    href,
                    &text,
                    format!("{}[fallback]", self.name()),
                ));
            }
        }
        out
    }
}

impl Extractor for StructuralExtractor {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn extract(&self, document: &Html, base_url: &Url) -> Extraction {
        let out = self.scan_blocks(document, base_url);
        if !out.candidates.is_empty() {
            return out;
        }
        log::debug!("No structural blocks on {base_url}, scanning links");
        self.scan_links(document, base_url)
    }
}
