//! Strategy selection by URL shape.
//!
//! Maps each source URL to the ordered extractor list of the first site
//! rule whose hints match. The last configured rule doubles as the
//! fallback, so new site families are added by inserting a rule above it.

use std::sync::Arc;

use super::Taxonomy;
use super::extractors::{Extractor, build_extractor};
use crate::error::{AppError, Result};
use crate::models::{ExtractionConfig, SiteRule};

/// A site rule with its extractors built.
pub struct SiteStrategy {
    pub rule: SiteRule,
    pub extractors: Vec<Box<dyn Extractor>>,
}

impl SiteStrategy {
    fn build(rule: &SiteRule, taxonomy: &Arc<Taxonomy>, config: &ExtractionConfig) -> Result<Self> {
        let extractors = rule
            .strategies
            .iter()
            .map(|kind| build_extractor(*kind, taxonomy, config))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            rule: rule.clone(),
            extractors,
        })
    }

    pub fn name(&self) -> &str {
        &self.rule.name
    }

    pub fn max_pages(&self) -> usize {
        self.rule.max_pages
    }

    pub fn extractor_names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }
}

/// Service for picking the extraction strategies of a source.
pub struct StrategySelector {
    rules: Vec<SiteStrategy>,
    fallback: SiteStrategy,
}

impl StrategySelector {
    /// Build every rule's extractors up front.
    pub fn new(
        sites: &[SiteRule],
        taxonomy: &Arc<Taxonomy>,
        config: &ExtractionConfig,
    ) -> Result<Self> {
        let (last, rest) = sites
            .split_last()
            .ok_or_else(|| AppError::config("at least one [[sites]] rule is required"))?;

        Ok(Self {
            rules: rest
                .iter()
                .map(|rule| SiteStrategy::build(rule, taxonomy, config))
                .collect::<Result<_>>()?,
            fallback: SiteStrategy::build(last, taxonomy, config)?,
        })
    }

    /// Strategy for a source URL.
    pub fn select(&self, url: &str) -> &SiteStrategy {
        let strategy = self
            .rules
            .iter()
            .find(|s| s.rule.matches(url))
            .unwrap_or(&self.fallback);
        log::debug!("Site rule '{}' for URL: {}", strategy.name(), url);
        strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Config, StrategyKind, TaxonomyConfig};

    fn selector(sites: &[SiteRule]) -> Result<StrategySelector> {
        let taxonomy = Arc::new(Taxonomy::compile(&TaxonomyConfig::default()).unwrap());
        StrategySelector::new(sites, &taxonomy, &ExtractionConfig::default())
    }

    #[test]
    fn test_default_table() {
        let selector = selector(&Config::default().sites).unwrap();

        let kv = selector.select("https://www.kvboerse.de/suche?fach=kjp");
        assert_eq!(kv.name(), "kvboerse");
        assert_eq!(kv.max_pages(), 10);
        assert_eq!(kv.extractor_names(), vec!["structural", "structured_data"]);

        assert_eq!(selector.select("https://klinik.test/Karriere/").name(), "portal");

        let content = selector.select("https://praxis.test/team");
        assert_eq!(content.name(), "content");
        assert_eq!(
            content.extractor_names(),
            vec!["links", "structured_data", "free_text"]
        );
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let sites = vec![
            SiteRule {
                name: "first".to_string(),
                url_contains: vec!["jobs".to_string()],
                strategies: vec![StrategyKind::Links],
                max_pages: 1,
            },
            SiteRule {
                name: "second".to_string(),
                url_contains: vec!["jobs".to_string()],
                strategies: vec![StrategyKind::FreeText],
                max_pages: 1,
            },
            SiteRule {
                name: "rest".to_string(),
                url_contains: Vec::new(),
                strategies: vec![StrategyKind::Links],
                max_pages: 1,
            },
        ];
        let selector = selector(&sites).unwrap();
        assert_eq!(selector.select("https://x.test/jobs").name(), "first");
    }

    #[test]
    fn test_last_rule_is_fallback() {
        let sites = vec![
            SiteRule {
                name: "kv".to_string(),
                url_contains: vec!["kvboerse".to_string()],
                strategies: vec![StrategyKind::Structural],
                max_pages: 5,
            },
            SiteRule {
                name: "only-stellen".to_string(),
                url_contains: vec!["stellen".to_string()],
                strategies: vec![StrategyKind::Links],
                max_pages: 1,
            },
        ];
        let selector = selector(&sites).unwrap();
        assert_eq!(selector.select("https://other.test/").name(), "only-stellen");
    }

    #[test]
    fn test_empty_table_is_config_error() {
        let err = selector(&[]).err().unwrap();
        assert!(err.is_fatal());
    }
}
