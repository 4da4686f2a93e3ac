// src/services/extractors/mod.rs

//! Page extraction strategies.
//!
//! Every strategy turns one parsed page into candidates. Strategies never
//! fail as a whole: a block that cannot be parsed is reported in
//! [`Extraction::failures`] and the rest of the page is still used.

mod free_text;
mod links;
mod structural;
mod structured;

use std::collections::HashSet;
use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Candidate, ExtractionConfig, StrategyKind};
use crate::services::Taxonomy;

pub use free_text::FreeTextExtractor;
pub use links::LinkExtractor;
pub use structural::StructuralExtractor;
pub use structured::StructuredDataExtractor;

/// Output of one strategy over one page.
#[derive(Debug, Default)]
pub struct Extraction {
    pub candidates: Vec<Candidate>,
    pub failures: Vec<AppError>,
}

impl Extraction {
    pub fn push(&mut self, candidate: Option<Candidate>) {
        if let Some(candidate) = candidate {
            self.candidates.push(candidate);
        }
    }

    /// Append another extraction, keeping order.
    pub fn merge(&mut self, other: Extraction) {
        self.candidates.extend(other.candidates);
        self.failures.extend(other.failures);
    }
}

/// A page extraction strategy.
pub trait Extractor: Send + Sync {
    /// Tag recorded on every candidate this strategy produces.
    fn name(&self) -> &'static str;

    /// Extract candidates from a parsed page.
    fn extract(&self, document: &Html, base_url: &Url) -> Extraction;
}

/// Build the extractor for a strategy kind.
pub fn build_extractor(
    kind: StrategyKind,
    taxonomy: &Arc<Taxonomy>,
    config: &ExtractionConfig,
) -> Result<Box<dyn Extractor>> {
    Ok(match kind {
        StrategyKind::Links => Box::new(LinkExtractor::new(Arc::clone(taxonomy), config)?),
        StrategyKind::Structural => Box::new(StructuralExtractor::new(config)?),
        StrategyKind::StructuredData => Box::new(StructuredDataExtractor::new()?),
        StrategyKind::FreeText => Box::new(FreeTextExtractor::new(Arc::clone(taxonomy), config)),
    })
}

/// Run several extractors over one page and concatenate their output.
pub fn extract_all(
    extractors: &[Box<dyn Extractor>],
    document: &Html,
    base_url: &Url,
) -> Extraction {
    let mut out = Extraction::default();
    for extractor in extractors {
        let extraction = extractor.extract(document, base_url);
        log::debug!(
            "{}: {} candidates, {} failures on {}",
            extractor.name(),
            extraction.candidates.len(),
            extraction.failures.len(),
            base_url
        );
        out.merge(extraction);
    }
    out
}

/// Collapse candidates sharing URL and title prefix, keeping first occurrence.
pub fn dedup_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.dedup_key()))
        .collect()
}

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

pub(crate) fn parse_selectors(list: &[String]) -> Result<Vec<Selector>> {
    list.iter().map(|s| parse_selector(s)).collect()
}

/// Text nodes outside script and style elements, trimmed and non-empty.
pub(crate) fn text_nodes(document: &Html) -> Vec<String> {
    document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node
                .parent()
                .and_then(|p| p.value().as_element().map(|e| e.name()))
                .is_some_and(|name| matches!(name, "script" | "style" | "noscript" | "template"));
            if hidden {
                return None;
            }
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
        .collect()
}

/// Elements that end a rendered line.
const BLOCK_ELEMENTS: [&str; 24] = [
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "footer",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "p", "section", "td", "tr",
];

/// Render the page to text, breaking lines at block elements.
///
/// Lines are whitespace-collapsed and empty lines dropped.
pub(crate) fn rendered_lines(document: &Html) -> Vec<String> {
    let mut buffer = String::new();
    render_into(document.root_element(), &mut buffer);
    buffer
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}

fn render_into(element: ElementRef<'_>, buffer: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            buffer.push_str(&text.replace('\n', " "));
        } else if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if matches!(name, "script" | "style" | "noscript" | "template") {
                continue;
            }
            render_into(child_el, buffer);
            if BLOCK_ELEMENTS.contains(&name) {
                buffer.push('\n');
            } else {
                buffer.push(' ');
            }
        }
    }
}

/// Whole-page visible text joined by single spaces.
pub(crate) fn visible_text(document: &Html) -> String {
    text_nodes(document).join(" ")
}

/// Text content of an element with collapsed whitespace.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaxonomyConfig;

    fn base() -> Url {
        Url::parse("https://klinik.test/karriere/").unwrap()
    }

    #[test]
    fn test_visible_text_skips_scripts() {
        let doc = Html::parse_document(
            "<html><head><script>var kjpp = 1;</script><style>.a{}</style></head>\
             <body><p>Hallo</p><p> Welt </p></body></html>",
        );
        assert_eq!(visible_text(&doc), "Hallo Welt");
    }

    #[test]
    fn test_rendered_lines_break_at_blocks() {
        let doc = Html::parse_document(
            "<body><div><p>Wir suchen: <b>Facharzt</b> KJPP</p><p>Zweite\nZeile</p></div>\
             <ul><li>A</li><li>B<br>C</li></ul><script>x()</script></body>",
        );
        assert_eq!(
            rendered_lines(&doc),
            vec!["Wir suchen: Facharzt KJPP", "Zweite Zeile", "A", "B", "C"]
        );
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let a = Candidate::from_link(&base(), "/a", "Facharzt KJPP", "links").unwrap();
        let b = Candidate::from_link(&base(), "/a", "Facharzt KJPP", "structural").unwrap();
        let c = Candidate::from_link(&base(), "/b", "Facharzt KJPP", "links").unwrap();
        let out = dedup_candidates(vec![a.clone(), b, c.clone()]);
        assert_eq!(out, vec![a, c]);
    }

    #[test]
    fn test_repeated_extraction_dedups_to_same_size() {
        let taxonomy = Arc::new(Taxonomy::compile(&TaxonomyConfig::default()).unwrap());
        let config = ExtractionConfig::default();
        let extractors: Vec<Box<dyn Extractor>> = vec![
            build_extractor(StrategyKind::Links, &taxonomy, &config).unwrap(),
            build_extractor(StrategyKind::Structural, &taxonomy, &config).unwrap(),
        ];
        let doc = Html::parse_document(
            r#"<div class="job-item"><h3>Oberarzt Kinder- und Jugendpsychiatrie</h3>
               <a href="/jobs/7">Details zur Stelle ansehen</a></div>
               <a href="/jobs/8">Assistenzarzt KJPP (m/w/d)</a>"#,
        );

        let once = dedup_candidates(extract_all(&extractors, &doc, &base()).candidates);
        let mut twice = extract_all(&extractors, &doc, &base()).candidates;
        twice.extend(extract_all(&extractors, &doc, &base()).candidates);
        let twice = dedup_candidates(twice);

        assert!(!once.is_empty());
        assert_eq!(once.len(), twice.len());
    }

    #[test]
    fn test_invalid_selector_is_config_error() {
        let config = ExtractionConfig {
            structural_selectors: vec!["[[broken".to_string()],
            ..ExtractionConfig::default()
        };
        assert!(StructuralExtractor::new(&config).is_err());
    }
}
