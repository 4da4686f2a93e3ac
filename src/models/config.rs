//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Hard message size cap of the notification transport.
pub const TRANSPORT_MESSAGE_CAP: usize = 4096;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and politeness settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Keyword and role patterns used by extractors and the classifier
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,

    /// Heuristics shared by the extractors
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Strategy selection table, first match wins
    #[serde(default = "defaults::sites")]
    pub sites: Vec<SiteRule>,

    /// Notification settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// File locations relative to the data directory
    #[serde(default)]
    pub paths: PathsConfig,

    /// Export file wording
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::config("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::config("fetch.timeout_secs must be > 0"));
        }
        if self.notify.timeout_secs == 0 {
            return Err(AppError::config("notify.timeout_secs must be > 0"));
        }
        if self.notify.chunk_chars == 0 || self.notify.chunk_chars >= TRANSPORT_MESSAGE_CAP {
            return Err(AppError::config(format!(
                "notify.chunk_chars must be between 1 and {}",
                TRANSPORT_MESSAGE_CAP - 1
            )));
        }
        if self.sites.is_empty() {
            return Err(AppError::config("No site rules defined"));
        }
        for site in &self.sites {
            if site.strategies.is_empty() {
                return Err(AppError::config(format!(
                    "Site rule '{}' has no strategies",
                    site.name
                )));
            }
            if site.max_pages == 0 {
                return Err(AppError::config(format!(
                    "Site rule '{}' needs max_pages >= 1",
                    site.name
                )));
            }
        }
        if self.taxonomy.keywords.is_empty() {
            return Err(AppError::config("No taxonomy keywords defined"));
        }
        if self.extraction.free_text_min_chars > self.extraction.free_text_max_chars {
            return Err(AppError::config(
                "extraction.free_text_min_chars exceeds free_text_max_chars",
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            taxonomy: TaxonomyConfig::default(),
            extraction: ExtractionConfig::default(),
            sites: defaults::sites(),
            notify: NotifyConfig::default(),
            paths: PathsConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

/// HTTP header profile, timeouts and politeness delays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Accept header
    #[serde(default = "defaults::accept")]
    pub accept: String,

    /// Accept-Language header
    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay after each source URL in milliseconds
    #[serde(default = "defaults::source_delay")]
    pub source_delay_ms: u64,

    /// Delay between paginated page fetches in milliseconds
    #[serde(default = "defaults::page_delay")]
    pub page_delay_ms: u64,

    /// Bodies shorter than this (after trimming) count as failed fetches
    #[serde(default = "defaults::min_body_bytes")]
    pub min_body_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            accept: defaults::accept(),
            accept_language: defaults::accept_language(),
            timeout_secs: defaults::timeout(),
            source_delay_ms: defaults::source_delay(),
            page_delay_ms: defaults::page_delay(),
            min_body_bytes: defaults::min_body_bytes(),
        }
    }
}

/// Regex pattern groups. Each group is joined into one alternation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    /// Broad specialty keywords used for discovery
    #[serde(default = "defaults::keywords")]
    pub keywords: Vec<String>,

    /// Physician-grade role tokens
    #[serde(default = "defaults::physician_roles")]
    pub physician_roles: Vec<String>,

    /// Specialty tokens that must co-occur with a physician role
    #[serde(default = "defaults::specialty")]
    pub specialty: Vec<String>,

    /// Secondary-profession tokens (psychologists, nurses, ...)
    #[serde(default = "defaults::secondary_roles")]
    pub secondary_roles: Vec<String>,

    /// Partial specialty tokens that pair with secondary roles
    #[serde(default = "defaults::partial_specialty")]
    pub partial_specialty: Vec<String>,

    /// Noise terms that exclude a candidate outright
    #[serde(default = "defaults::exclusions")]
    pub exclusions: Vec<String>,

    /// Role tokens the free-text extractor looks for
    #[serde(default = "defaults::free_text_roles")]
    pub free_text_roles: Vec<String>,

    /// Titles shorter than this are excluded
    #[serde(default = "defaults::min_title_chars")]
    pub min_title_chars: usize,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            keywords: defaults::keywords(),
            physician_roles: defaults::physician_roles(),
            specialty: defaults::specialty(),
            secondary_roles: defaults::secondary_roles(),
            partial_specialty: defaults::partial_specialty(),
            exclusions: defaults::exclusions(),
            free_text_roles: defaults::free_text_roles(),
            min_title_chars: defaults::min_title_chars(),
        }
    }
}

/// Heuristics for the extraction strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// URL fragments that mark a link as job-related
    #[serde(default = "defaults::job_path_hints")]
    pub job_path_hints: Vec<String>,

    /// Boilerplate path words that disqualify a link
    #[serde(default = "defaults::blocked_path_words")]
    pub blocked_path_words: Vec<String>,

    /// Ordered CSS selectors for posting blocks
    #[serde(default = "defaults::structural_selectors")]
    pub structural_selectors: Vec<String>,

    /// Ordered CSS selectors for a block's title
    #[serde(default = "defaults::title_selectors")]
    pub title_selectors: Vec<String>,

    /// Minimum text length of a posting block
    #[serde(default = "defaults::min_block_chars")]
    pub min_block_chars: usize,

    /// Minimum title length for structural candidates
    #[serde(default = "defaults::min_structural_title_chars")]
    pub min_title_chars: usize,

    /// Minimum anchor text length in the structural link fallback
    #[serde(default = "defaults::min_fallback_link_chars")]
    pub min_fallback_link_chars: usize,

    /// Anchor text terms accepted by the structural link fallback
    #[serde(default = "defaults::fallback_link_terms")]
    pub fallback_link_terms: Vec<String>,

    /// Shortest line the free-text extractor considers
    #[serde(default = "defaults::free_text_min_chars")]
    pub free_text_min_chars: usize,

    /// Longest line the free-text extractor considers
    #[serde(default = "defaults::free_text_max_chars")]
    pub free_text_max_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            job_path_hints: defaults::job_path_hints(),
            blocked_path_words: defaults::blocked_path_words(),
            structural_selectors: defaults::structural_selectors(),
            title_selectors: defaults::title_selectors(),
            min_block_chars: defaults::min_block_chars(),
            min_title_chars: defaults::min_structural_title_chars(),
            min_fallback_link_chars: defaults::min_fallback_link_chars(),
            fallback_link_terms: defaults::fallback_link_terms(),
            free_text_min_chars: defaults::free_text_min_chars(),
            free_text_max_chars: defaults::free_text_max_chars(),
        }
    }
}

/// Extraction strategy identifiers usable in site rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Links,
    Structural,
    StructuredData,
    FreeText,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Links => "links",
            Self::Structural => "structural",
            Self::StructuredData => "structured_data",
            Self::FreeText => "free_text",
        }
    }
}

/// One row of the strategy selection table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRule {
    /// Rule name for logging
    pub name: String,

    /// Matches when the lowercased URL contains any of these; empty matches all
    #[serde(default)]
    pub url_contains: Vec<String>,

    /// Extractors applied to every page, in order
    pub strategies: Vec<StrategyKind>,

    /// Page bound for the paginated crawler; 1 disables pagination
    #[serde(default = "defaults::max_pages")]
    pub max_pages: usize,
}

impl SiteRule {
    /// Check whether this rule applies to a source URL.
    pub fn matches(&self, url: &str) -> bool {
        if self.url_contains.is_empty() {
            return true;
        }
        let url = url.to_lowercase();
        self.url_contains
            .iter()
            .any(|hint| url.contains(&hint.to_lowercase()))
    }
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Include related roles in the notification body
    #[serde(default = "defaults::include_related")]
    pub include_related: bool,

    /// Maximum characters per message chunk
    #[serde(default = "defaults::chunk_chars")]
    pub chunk_chars: usize,

    /// Bot API base URL
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            include_related: defaults::include_related(),
            chunk_chars: defaults::chunk_chars(),
            api_base: defaults::api_base(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// File names, relative to the data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "defaults::url_list")]
    pub url_list: String,
    #[serde(default = "defaults::state_file")]
    pub state_file: String,
    #[serde(default = "defaults::all_results")]
    pub all_results: String,
    #[serde(default = "defaults::new_results")]
    pub new_results: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            url_list: defaults::url_list(),
            state_file: defaults::state_file(),
            all_results: defaults::all_results(),
            new_results: defaults::new_results(),
        }
    }
}

/// Wording of the export files and notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "defaults::all_header")]
    pub all_header: String,
    #[serde(default = "defaults::new_header")]
    pub new_header: String,
    #[serde(default = "defaults::empty_placeholder")]
    pub empty_placeholder: String,
    #[serde(default = "defaults::untitled")]
    pub untitled: String,
    #[serde(default = "defaults::message_title")]
    pub message_title: String,
    #[serde(default = "defaults::physician_section")]
    pub physician_section: String,
    #[serde(default = "defaults::related_section")]
    pub related_section: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            all_header: defaults::all_header(),
            new_header: defaults::new_header(),
            empty_placeholder: defaults::empty_placeholder(),
            untitled: defaults::untitled(),
            message_title: defaults::message_title(),
            physician_section: defaults::physician_section(),
            related_section: defaults::related_section(),
        }
    }
}

mod defaults {
    use super::{SiteRule, StrategyKind};

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    // Fetch defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/124.0.0.0 Safari/537.36"
            .into()
    }
    pub fn accept() -> String {
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8".into()
    }
    pub fn accept_language() -> String {
        "de-DE,de;q=0.9,en;q=0.8".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn source_delay() -> u64 {
        2000
    }
    pub fn page_delay() -> u64 {
        1000
    }
    pub fn min_body_bytes() -> usize {
        32
    }

    // Taxonomy defaults
    pub fn keywords() -> Vec<String> {
        owned(&[
            r"kinder-?\s*und-?\s*jugendpsychi",
            r"kinder-?\s*und-?\s*jugendpsychother",
            r"\bkjpp\b",
            r"\bkjp\b",
            r"jugendpsychiatr",
            r"kinderpsychiatr",
            r"kinder-?jugend-?psych",
        ])
    }
    pub fn physician_roles() -> Vec<String> {
        owned(&[
            r"fach(arzt|ärztin)",
            r"ober(arzt|ärztin)",
            r"assistenz(arzt|ärztin)",
            r"chef(arzt|ärztin)",
            r"weiterbildungsassistent",
            r"\barzt\b",
            r"\bärztin(nen)?\b",
            r"\bärzte\b",
        ])
    }
    pub fn specialty() -> Vec<String> {
        owned(&[
            r"kinder.{0,20}jugendpsychiatr",
            r"\bkjpp?\b",
        ])
    }
    pub fn secondary_roles() -> Vec<String> {
        owned(&[
            r"psycholog",
            r"psychotherapeut",
            r"therapeut",
            r"pflege",
            r"pädagog",
            r"erzieher",
            r"sozialarbeit",
            r"heilerziehung",
        ])
    }
    pub fn partial_specialty() -> Vec<String> {
        owned(&[r"kinder", r"jugend"])
    }
    pub fn exclusions() -> Vec<String> {
        owned(&[
            r"niederlassung",
            r"praxisabgabe",
            r"praxisnachfolge",
            r"praxisübergabe",
            r"zuweiser",
            r"überweisung",
            r"fortbildung",
            r"kongress",
            r"symposium",
            r"veranstaltung",
            r"pressemitteilung",
            r"newsletter",
            r"impressum",
            r"datenschutz",
            r"famulatur",
            r"geriatr",
            r"gynäkolog",
            r"orthopäd",
            r"radiolog",
            r"anästhesi",
            r"chirurg",
            r"zahnmedizin",
        ])
    }
    pub fn free_text_roles() -> Vec<String> {
        owned(&[
            r"fach(arzt|ärztin)",
            r"ober(arzt|ärztin)",
            r"assistenz(arzt|ärztin)",
            r"\barzt\b",
            r"\bärztin\b",
            r"psychotherapeut",
            r"psycholog",
            r"therapeut",
        ])
    }
    pub fn min_title_chars() -> usize {
        10
    }

    // Extraction defaults
    pub fn job_path_hints() -> Vec<String> {
        owned(&[
            "/stellen",
            "/jobs",
            "/karriere",
            "/bewerb",
            "/stellenangebot",
            "/ausschreibung",
            "vacanc",
            "job",
            "position",
            "bewerb",
            "medizin",
            "arzt",
            "psycholog",
        ])
    }
    pub fn blocked_path_words() -> Vec<String> {
        owned(&[
            "impressum",
            "datenschutz",
            "privacy",
            "login",
            "sitemap",
            "agb",
            "cookie",
        ])
    }
    pub fn structural_selectors() -> Vec<String> {
        owned(&[
            ".job-listing",
            ".job-item",
            ".stellenangebot",
            ".search-result",
            ".result-item",
            "[class*=\"job\"]",
            ".card",
            ".teaser",
            ".listing-item",
            "article",
            ".item",
            ".entry",
            ".job-teaser",
            ".stellen-teaser",
        ])
    }
    pub fn title_selectors() -> Vec<String> {
        owned(&[
            "h1",
            "h2",
            "h3",
            "h4",
            ".title",
            ".headline",
            "[class*=\"title\"]",
        ])
    }
    pub fn min_block_chars() -> usize {
        20
    }
    pub fn min_structural_title_chars() -> usize {
        6
    }
    pub fn min_fallback_link_chars() -> usize {
        10
    }
    pub fn fallback_link_terms() -> Vec<String> {
        owned(&["arzt", "ärztin", "stellen", "job", "psych", "facharzt"])
    }
    pub fn free_text_min_chars() -> usize {
        15
    }
    pub fn free_text_max_chars() -> usize {
        200
    }

    // Strategy table defaults
    pub fn max_pages() -> usize {
        1
    }
    pub fn sites() -> Vec<SiteRule> {
        vec![
            SiteRule {
                name: "kvboerse".to_string(),
                url_contains: owned(&["kvboerse"]),
                strategies: vec![StrategyKind::Structural, StrategyKind::StructuredData],
                max_pages: 10,
            },
            SiteRule {
                name: "portal".to_string(),
                url_contains: owned(&["stellen", "jobs", "karriere", "career"]),
                strategies: vec![StrategyKind::Structural, StrategyKind::StructuredData],
                max_pages: 3,
            },
            SiteRule {
                name: "content".to_string(),
                url_contains: Vec::new(),
                strategies: vec![
                    StrategyKind::Links,
                    StrategyKind::StructuredData,
                    StrategyKind::FreeText,
                ],
                max_pages: 1,
            },
        ]
    }

    // Notify defaults
    pub fn include_related() -> bool {
        true
    }
    pub fn chunk_chars() -> usize {
        3500
    }
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }

    // Path defaults
    pub fn url_list() -> String {
        "job_urls.txt".into()
    }
    pub fn state_file() -> String {
        "state.json".into()
    }
    pub fn all_results() -> String {
        "last_results.txt".into()
    }
    pub fn new_results() -> String {
        "last_new_results.txt".into()
    }

    // Export wording defaults
    pub fn all_header() -> String {
        "Alle Treffer dieses Laufs (KJPP zuerst):".into()
    }
    pub fn new_header() -> String {
        "Neue Treffer dieses Laufs (KJPP zuerst):".into()
    }
    pub fn empty_placeholder() -> String {
        "(keine Treffer)".into()
    }
    pub fn untitled() -> String {
        "(ohne Titel)".into()
    }
    pub fn message_title() -> String {
        "🆕 Neue KJPP-Stellen".into()
    }
    pub fn physician_section() -> String {
        "👨‍⚕️ KJPP-Arztstellen:".into()
    }
    pub fn related_section() -> String {
        "💼 Verwandte Positionen:".into()
    }
}
