// src/services/extractors/free_text.rs

//! Free-text line scanning for pages without links or markup.

use std::sync::Arc;

use scraper::Html;
use url::Url;

use super::{Extraction, Extractor, rendered_lines};
use crate::models::{Candidate, ExtractionConfig};
use crate::services::Taxonomy;

/// Emits rendered lines naming both a role and the specialty.
///
/// The page URL stands in for the posting link since plain text has none.
pub struct FreeTextExtractor {
    taxonomy: Arc<Taxonomy>,
    min_chars: usize,
    max_chars: usize,
}

impl FreeTextExtractor {
    pub fn new(taxonomy: Arc<Taxonomy>, config: &ExtractionConfig) -> Self {
        Self {
            taxonomy,
            min_chars: config.free_text_min_chars,
            max_chars: config.free_text_max_chars,
        }
    }

    fn accepts(&self, line: &str) -> bool {
        let len = line.chars().count();
        (self.min_chars..=self.max_chars).contains(&len)
            && self.taxonomy.free_text_roles.is_match(line)
            && self.taxonomy.keywords.is_match(line)
    }
}

impl Extractor for FreeTextExtractor {
    fn name(&self) -> &'static str {
        "free_text"
    }

    fn extract(&self, document: &Html, base_url: &Url) -> Extraction {
        let mut extraction = Extraction::default();
        for line in rendered_lines(document) {
            if self.accepts(&line) {
                extraction.push(Candidate::new(base_url, &line, self.name()));
            }
        }
        extraction
    }
}
