//! Structured-data extraction (JSON-LD, meta tags, data attributes).
//!
//! Structured data is curated by the publishing site, so every posting found
//! here becomes a candidate without keyword filtering.

use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use super::{Extraction, Extractor, parse_selector};
use crate::error::{AppError, Result};
use crate::models::Candidate;
use crate::utils::resolve_http_link;

/// Meta name/property fragments that mark a job field.
const META_HINTS: [&str; 3] = ["job", "position", "stelle"];

/// Data attributes carrying a posting title, in lookup order.
const DATA_ATTRS: [&str; 4] = ["data-job-title", "data-jobtitle", "data-position", "data-job"];

pub struct StructuredDataExtractor {
    ld_json: Selector,
    meta: Selector,
    data_attrs: Selector,
    anchors: Selector,
}

impl StructuredDataExtractor {
    pub fn new() -> Result<Self> {
        let data_attrs = DATA_ATTRS
            .iter()
            .map(|a| format!("[{a}]"))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(Self {
            ld_json: parse_selector(r#"script[type="application/ld+json"]"#)?,
            meta: parse_selector("meta[content]")?,
            data_attrs: parse_selector(&data_attrs)?,
            anchors: parse_selector("a[href]")?,
        })
    }

    fn extract_ld_json(&self, document: &Html, base_url: &Url, out: &mut Extraction) {
        for (index, script) in document.select(&self.ld_json).enumerate() {
            let raw: String = script.text().collect();
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let context = format!("ld+json block {} on {}", index + 1, base_url);
            match serde_json::from_str::<Value>(raw) {
                Ok(value) => self.walk_ld_value(&value, base_url, &context, out),
                Err(e) => out.failures.push(AppError::parse(context, e)),
            }
        }
    }

    fn walk_ld_value(&self, value: &Value, base_url: &Url, context: &str, out: &mut Extraction) {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.walk_ld_value(item, base_url, context, out);
                }
            }
            Value::Object(map) => {
                if let Some(graph) = map.get("@graph") {
                    self.walk_ld_value(graph, base_url, context, out);
                }
                if is_job_posting(value) {
                    match job_posting_candidate(value, base_url, self.name()) {
                        Ok(candidate) => out.push(candidate),
                        Err(e) => out.failures.push(AppError::parse(context, e)),
                    }
                }
            }
            _ => {}
        }
    }

    fn extract_meta(&self, document: &Html, base_url: &Url, out: &mut Extraction) {
        for meta in document.select(&self.meta) {
            let el = meta.value();
            let key = el
                .attr("name")
                .or_else(|| el.attr("property"))
                .unwrap_or_default()
                .to_lowercase();
            if !META_HINTS.iter().any(|hint| key.contains(hint)) {
                continue;
            }
            let content = el.attr("content").unwrap_or_default();
            if content.trim().is_empty() {
                continue;
            }
            out.push(Candidate::new(base_url, content, format!("{}[meta]", self.name())));
        }
    }

    fn extract_data_attrs(&self, document: &Html, base_url: &Url, out: &mut Extraction) {
        for element in document.select(&self.data_attrs) {
            let el = element.value();
            let Some(title) = DATA_ATTRS
                .iter()
                .filter_map(|a| el.attr(a))
                .find(|v| !v.trim().is_empty())
            else {
                continue;
            };
            let href = el
                .attr("href")
                .and_then(|h| resolve_http_link(base_url, h))
                .or_else(|| {
                    element
                        .select(&self.anchors)
                        .filter_map(|a| a.value().attr("href"))
                        .find_map(|h| resolve_http_link(base_url, h))
                })
                .unwrap_or_else(|| base_url.clone());
            out.push(Candidate::new(&href, title, format!("{}[data]", self.name())));
        }
    }
}

impl Extractor for StructuredDataExtractor {
    fn name(&self) -> &'static str {
        "structured_data"
    }

    fn extract(&self, document: &Html, base_url: &Url) -> Extraction {
        let mut out = Extraction::default();
        self.extract_ld_json(document, base_url, &mut out);
        self.extract_meta(document, base_url, &mut out);
        self.extract_data_attrs(document, base_url, &mut out);
        out
    }
}

fn is_job_posting(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t.eq_ignore_ascii_case("JobPosting"),
        Some(Value::Array(types)) => types
            .iter()
            .any(|t| t.as_str().is_some_and(|t| t.eq_ignore_ascii_case("JobPosting"))),
        _ => false,
    }
}

fn job_posting_candidate(
    value: &Value,
    base_url: &Url,
    strategy: &str,
) -> std::result::Result<Option<Candidate>, String> {
    let title = ["title", "name"]
        .iter()
        .filter_map(|k| value.get(*k).and_then(Value::as_str))
        .find(|t| !t.trim().is_empty())
        .ok_or_else(|| "JobPosting without title".to_string())?;

    let href = ["url", "sameAs"]
        .iter()
        .filter_map(|k| value.get(*k).and_then(Value::as_str))
        .find_map(|u| resolve_http_link(base_url, u))
        .unwrap_or_else(|| base_url.clone());

    Ok(Candidate::new(&href, title, format!("{strategy}[ld+json]")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> Extraction {
        let base = Url::parse("https://klinik.test/karriere").unwrap();
        StructuredDataExtractor::new()
            .unwrap()
            .extract(&Html::parse_document(html), &base)
    }

    #[test]
    fn test_json_ld_job_posting() {
        let out = run(
            r#"<script type="application/ld+json">
               {"@context":"https://schema.org","@type":"JobPosting",
                "title":"Oberarzt (m/w/d) KJPP","url":"/jobs/oa-kjpp"}
               </script>"#,
        );
        assert!(out.failures.is_empty());
        assert_eq!(out.candidates.len(), 1);
        assert_eq!(out.candidates[0].title, "Oberarzt (m/w/d) KJPP");
        assert_eq!(out.candidates[0].href, "https://klinik.test/jobs/oa-kjpp");
        assert_eq!(out.candidates[0].source_strategy, "structured_data[ld+json]");
    }

    #[test]
    fn test_json_ld_graph_and_arrays() {
        let out = run(
            r#"<script type="application/ld+json">
               {"@graph":[{"@type":"Organization","name":"Klinik"},
                          {"@type":["JobPosting"],"name":"Psychologin KJP"}]}
               </script>
               <script type="application/ld+json">
               [{"@type":"JobPosting","title":"Facharzt KJP","sameAs":"https://jobs.test/1"}]
               </script>"#,
        );
        let titles: Vec<_> = out.candidates.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Psychologin KJP", "Facharzt KJP"]);
        assert_eq!(out.candidates[0].href, "https://klinik.test/karriere");
        assert_eq!(out.candidates[1].href, "https://jobs.test/1");
    }

    #[test]
    fn test_malformed_block_is_isolated() {
        let out = run(
            r#"<script type="application/ld+json">{"@type":"JobPosting",</script>
               <script type="application/ld+json">{"@type":"JobPosting","title":"Assistenzarzt KJPP"}</script>
               <script type="application/ld+json">{"@type":"JobPosting"}</script>"#,
        );
        assert_eq!(out.candidates.len(), 1);
        assert_eq!(out.failures.len(), 2);
        assert!(out.failures.iter().all(|e| matches!(e, AppError::Parse { .. })));
    }

    #[test]
    fn test_meta_tags() {
        let out = run(
            r#"<head>
               <meta name="job-title" content="Facharzt Kinder- und Jugendpsychiatrie">
               <meta property="og:title" content="Startseite">
               <meta name="position" content="  ">
               </head>"#,
        );
        assert_eq!(out.candidates.len(), 1);
        assert_eq!(out.candidates[0].source_strategy, "structured_data[meta]");
    }

    #[test]
    fn test_data_attributes() {
        let out = run(
            r#"<div data-job-title="Kinder- und Jugendlichenpsychotherapeut">
                 <a href="/bewerben/5">Jetzt bewerben</a>
               </div>
               <a data-position="Assistenzärztin KJPP" href="https://jobs.test/9">mehr</a>"#,
        );
        assert_eq!(out.candidates.len(), 2);
        assert_eq!(out.candidates[0].href, "https://klinik.test/bewerben/5");
        assert_eq!(out.candidates[1].href, "https://jobs.test/9");
        assert_eq!(out.candidates[1].title, "Assistenzärztin KJPP");
    }
}
