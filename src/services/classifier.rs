// src/services/classifier.rs

//! Candidate classification.
//!
//! Classification is an ordered rule table: each rule carries a label and a
//! set of conditions, and the first rule with a satisfied condition decides.
//! Exclusion rules come first so noise always beats keyword matches.

use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::{Classification, TaxonomyConfig};

/// Compiled pattern groups shared by extractors and the classifier.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    pub keywords: Regex,
    pub physician_roles: Regex,
    pub specialty: Regex,
    pub secondary_roles: Regex,
    pub partial_specialty: Regex,
    pub exclusions: Regex,
    pub free_text_roles: Regex,
    pub min_title_chars: usize,
}

impl Taxonomy {
    /// Compile every pattern group of the configuration.
    pub fn compile(config: &TaxonomyConfig) -> Result<Self> {
        Ok(Self {
            keywords: compile_group("keywords", &config.keywords)?,
            physician_roles: compile_group("physician_roles", &config.physician_roles)?,
            specialty: compile_group("specialty", &config.specialty)?,
            secondary_roles: compile_group("secondary_roles", &config.secondary_roles)?,
            partial_specialty: compile_group("partial_specialty", &config.partial_specialty)?,
            exclusions: compile_group("exclusions", &config.exclusions)?,
            free_text_roles: compile_group("free_text_roles", &config.free_text_roles)?,
            min_title_chars: config.min_title_chars,
        })
    }

    /// First broad keyword occurring in `text`, if any.
    pub fn find_keyword<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.keywords.find(text).map(|m| m.as_str())
    }
}

/// Join a pattern group into one case-insensitive alternation.
fn compile_group(group: &str, patterns: &[String]) -> Result<Regex> {
    // An empty group must never match.
    let body = if patterns.is_empty() {
        r"[^\s\S]".to_string()
    } else {
        patterns
            .iter()
            .map(|p| format!("(?:{p})"))
            .collect::<Vec<_>>()
            .join("|")
    };
    Regex::new(&format!("(?i){body}")).map_err(|source| AppError::Pattern {
        group: group.to_string(),
        source,
    })
}

/// A single test applied to the combined `title url` text.
#[derive(Debug, Clone)]
pub enum Condition {
    /// Pattern occurs anywhere
    Matches(Regex),
    /// Both patterns occur, in any order
    CoOccurs(Regex, Regex),
    /// Title has fewer characters than the bound
    TitleShorterThan(usize),
}

impl Condition {
    fn holds(&self, title: &str, text: &str) -> bool {
        match self {
            Self::Matches(re) => re.is_match(text),
            Self::CoOccurs(a, b) => a.is_match(text) && b.is_match(text),
            Self::TitleShorterThan(min) => title.chars().count() < *min,
        }
    }
}

/// One row of the rule table.
#[derive(Debug, Clone)]
pub struct Rule {
    pub label: Classification,
    pub any_of: Vec<Condition>,
}

/// Deterministic, stateless classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    /// Build the standard rule table from a compiled taxonomy.
    pub fn new(taxonomy: &Taxonomy) -> Self {
        Self::from_rules(Self::standard_rules(taxonomy))
    }

    /// Build a classifier from an explicit rule table.
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Exclusion, strict physician, related, in that order.
    pub fn standard_rules(taxonomy: &Taxonomy) -> Vec<Rule> {
        vec![
            Rule {
                label: Classification::Excluded,
                any_of: vec![
                    Condition::Matches(taxonomy.exclusions.clone()),
                    Condition::TitleShorterThan(taxonomy.min_title_chars),
                ],
            },
            Rule {
                label: Classification::PhysicianRole,
                any_of: vec![Condition::CoOccurs(
                    taxonomy.physician_roles.clone(),
                    taxonomy.specialty.clone(),
                )],
            },
            Rule {
                label: Classification::RelatedRole,
                any_of: vec![
                    Condition::CoOccurs(
                        taxonomy.secondary_roles.clone(),
                        taxonomy.partial_specialty.clone(),
                    ),
                    Condition::Matches(taxonomy.keywords.clone()),
                ],
            },
        ]
    }

    /// Classify a candidate by its title and URL.
    pub fn classify(&self, title: &str, url: &str) -> Classification {
        let title = title.trim();
        let text = format!("{title} {url}").to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.any_of.iter().any(|c| c.holds(title, &text)))
            .map(|rule| rule.label)
            .unwrap_or(Classification::Irrelevant)
    }

    /// Labels of every rule that would fire, in table order.
    #[cfg(test)]
    fn matching_labels(&self, title: &str, url: &str) -> Vec<Classification> {
        let title = title.trim();
        let text = format!("{title} {url}").to_lowercase();
        self.rules
            .iter()
            .filter(|rule| rule.any_of.iter().any(|c| c.holds(title, &text)))
            .map(|rule| rule.label)
            .collect()
    }
}
