// src/services/scanner.rs

//! Per-source scanning: strategy selection plus paginated extraction.

use std::sync::Arc;

use url::Url;

use super::Taxonomy;
use super::fetcher::PageFetcher;
use super::pagination::PaginatedCrawler;
use super::selectors::StrategySelector;
use crate::error::{AppError, Result};
use crate::models::{Candidate, Config};

/// Everything one source URL produced.
#[derive(Debug)]
pub struct SourceScan {
    pub url: String,
    /// Name of the site rule that was applied
    pub rule: String,
    pub pages: usize,
    /// Unique candidates in discovery order
    pub candidates: Vec<Candidate>,
    /// Isolated block and page failures; already logged
    pub failures: Vec<AppError>,
}

/// Scans single sources with the strategies their URL shape calls for.
pub struct SourceScanner {
    selector: StrategySelector,
    crawler: PaginatedCrawler,
}

impl SourceScanner {
    pub fn new(
        config: &Config,
        taxonomy: &Arc<Taxonomy>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self> {
        Ok(Self {
            selector: StrategySelector::new(&config.sites, taxonomy, &config.extraction)?,
            crawler: PaginatedCrawler::new(fetcher, &config.fetch)?,
        })
    }

    /// Scan one source.
    ///
    /// Fails only when the source as a whole is unusable: an invalid URL,
    /// or a first page that cannot be fetched or is empty.
    pub async fn scan(&self, url: &str) -> Result<SourceScan> {
        let start = Url::parse(url.trim())?;
        let strategy = self.selector.select(start.as_str());

        let crawl = self
            .crawler
            .crawl(&start, &strategy.extractors, strategy.max_pages())
            .await?;

        for failure in &crawl.failures {
            log::warn!("{url}: {failure}");
        }
        log::info!(
            "{} [{}]: {} candidates from {} page(s), {} failures",
            url,
            strategy.name(),
            crawl.candidates.len(),
            crawl.pages,
            crawl.failures.len()
        );

        Ok(SourceScan {
            url: url.to_string(),
            rule: strategy.name().to_string(),
            pages: crawl.pages,
            candidates: crawl.candidates,
            failures: crawl.failures,
        })
    }
}
