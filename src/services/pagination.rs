// src/services/pagination.rs

//! Paginated crawling.
//!
//! Wraps the fetch-and-extract step of one source in a bounded loop that
//! follows "next page" affordances. The loop ends when no next page is
//! found, a URL would repeat, or the page bound is reached. A page link
//! the page offers is always followed; a synthesized page URL only after a
//! page that brought new candidates.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use scraper::{Html, Selector};
use url::Url;

use super::extractors::{Extraction, Extractor, element_text, extract_all, parse_selector};
use super::fetcher::{PageFetcher, check_body};
use crate::error::{AppError, Result};
use crate::models::{Candidate, FetchConfig};
use crate::utils::resolve_http_link;
use crate::utils::url::{current_page, next_page_url};

/// Explicit next-page selectors, tried in order.
const NEXT_SELECTORS: [&str; 8] = [
    ".pagination .next a",
    ".pagination a.next",
    ".pager .next a",
    ".pager a.next",
    "a[rel=\"next\"]",
    "link[rel=\"next\"]",
    ".next-page a",
    "li.next a",
];

/// Anchor texts that announce the following page.
const NEXT_WORDS: [&str; 6] = ["weiter", "weitere", "nächste", "next", "»", "›"];

const PAGER_LINKS: &str = ".pagination a[href], .pager a[href]";
const PAGER_CURRENT: &str = ".pagination .active, .pagination .current, .pagination [aria-current], \
                             .pager .active, .pager .current, .pager [aria-current]";

/// Locates the next page of a listing.
pub struct NextPageFinder {
    explicit: Vec<Selector>,
    anchors: Selector,
    pager_links: Selector,
    pager_current: Selector,
}

impl NextPageFinder {
    pub fn new() -> Result<Self> {
        Ok(Self {
            explicit: NEXT_SELECTORS
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<_>>()?,
            anchors: parse_selector("a[href]")?,
            pager_links: parse_selector(PAGER_LINKS)?,
            pager_current: parse_selector(PAGER_CURRENT)?,
        })
    }

    /// Find the next-page link on `document`, if the page offers one.
    pub fn find(&self, document: &Html, current: &Url) -> Option<Url> {
        self.by_selector(document, current)
            .or_else(|| self.by_anchor_text(document, current))
            .or_else(|| self.by_page_number(document, current))
    }

    fn by_selector(&self, document: &Html, current: &Url) -> Option<Url> {
        self.explicit.iter().find_map(|selector| {
            document
                .select(selector)
                .filter_map(|el| el.value().attr("href"))
                .find_map(|href| resolve_http_link(current, href))
        })
    }

    fn by_anchor_text(&self, document: &Html, current: &Url) -> Option<Url> {
        document.select(&self.anchors).find_map(|el| {
            let text = element_text(&el).to_lowercase();
            let is_next = NEXT_WORDS
                .iter()
                .any(|w| text == *w || text.starts_with(&format!("{w} ")));
            if !is_next {
                return None;
            }
            resolve_http_link(current, el.value().attr("href")?)
        })
    }

    fn by_page_number(&self, document: &Html, current: &Url) -> Option<Url> {
        let page = document
            .select(&self.pager_current)
            .find_map(|el| element_text(&el).parse::<u64>().ok())
            .unwrap_or_else(|| current_page(current));
        let wanted = page.checked_add(1)?.to_string();

        document
            .select(&self.pager_links)
            .filter(|el| element_text(el) == wanted)
            .find_map(|el| resolve_http_link(current, el.value().attr("href")?))
    }
}

/// Result of crawling one source.
#[derive(Debug, Default)]
pub struct PageCrawl {
    /// Pages fetched successfully
    pub pages: usize,
    /// Candidates from all pages, deduplicated in discovery order
    pub candidates: Vec<Candidate>,
    /// Block-level and later-page failures
    pub failures: Vec<AppError>,
}

/// Bounded fetch-extract-follow loop.
pub struct PaginatedCrawler {
    fetcher: Arc<dyn PageFetcher>,
    finder: NextPageFinder,
    page_delay: Duration,
    min_body_bytes: usize,
}

impl PaginatedCrawler {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            fetcher,
            finder: NextPageFinder::new()?,
            page_delay: Duration::from_millis(config.page_delay_ms),
            min_body_bytes: config.min_body_bytes,
        })
    }

    /// Fetch and check one page body.
    pub async fn fetch_page(&self, url: &Url) -> Result<String> {
        let body = self.fetcher.fetch(url.as_str()).await?;
        check_body(url.as_str(), body, self.min_body_bytes)
    }

    /// Crawl from `start`, applying `extractors` to every page.
    ///
    /// A failure on the first page fails the source. A failure on a later
    /// page ends the crawl and keeps what was collected so far.
    pub async fn crawl(
        &self,
        start: &Url,
        extractors: &[Box<dyn Extractor>],
        max_pages: usize,
    ) -> Result<PageCrawl> {
        let max_pages = max_pages.max(1);
        let mut crawl = PageCrawl::default();
        let mut visited = HashSet::new();
        let mut seen = HashSet::new();
        let mut current = start.clone();

        loop {
            let mut key = current.clone();
            key.set_fragment(None);
            if !visited.insert(key.to_string()) {
                log::debug!("Pagination revisits {current}, stopping");
                break;
            }

            if crawl.pages > 0 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }

            let body = match self.fetch_page(&current).await {
                Ok(body) => body,
                Err(e) if crawl.pages == 0 => return Err(e),
                Err(e) => {
                    log::warn!("Stopping pagination at {current}: {e}");
                    crawl.failures.push(e);
                    break;
                }
            };
            crawl.pages += 1;

            // Html is not Send; keep it out of the next await.
            let (extraction, explicit_next) = {
                let document = Html::parse_document(&body);
                let extraction: Extraction = extract_all(extractors, &document, &current);
                let next = if crawl.pages < max_pages {
                    self.finder.find(&document, &current)
                } else {
                    None
                };
                (extraction, next)
            };

            let on_page = extraction.candidates.len();
            let before = crawl.candidates.len();
            crawl.candidates.extend(
                extraction
                    .candidates
                    .into_iter()
                    .filter(|c| seen.insert(c.dedup_key())),
            );
            crawl.failures.extend(extraction.failures);
            let fresh = crawl.candidates.len() - before;

            if crawl.pages >= max_pages {
                break;
            }

            let next = match explicit_next {
                Some(next) => Some(next),
                None if fresh == 0 => None,
                None => next_page_url(&current, on_page),
            };
            match next {
                Some(next) => current = next,
                None => break,
            }
        }

        Ok(crawl)
    }
}
