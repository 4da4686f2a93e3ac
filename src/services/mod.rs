//! Service layer for the monitor.
//!
//! This module contains the business logic for:
//! - Page fetching (`PageFetcher`, `HttpFetcher`)
//! - Candidate extraction strategies (`extractors`)
//! - Strategy selection by URL shape (`StrategySelector`)
//! - Paginated crawling and per-source scanning (`SourceScanner`)
//! - Classification (`Classifier`)
//! - Notification delivery (`TelegramNotifier`)

mod classifier;
pub mod extractors;
mod fetcher;
mod notifier;
mod pagination;
mod scanner;
mod selectors;

pub use classifier::{Classifier, Condition, Rule, Taxonomy};
pub use fetcher::{HttpFetcher, PageFetcher, check_body};
pub use notifier::{
    BOT_TOKEN_ENV, CHAT_ID_ENV, Notifier, NotifyOutcome, TelegramCredentials, TelegramNotifier,
    split_message,
};
pub use pagination::{NextPageFinder, PageCrawl, PaginatedCrawler};
pub use scanner::{SourceScan, SourceScanner};
pub use selectors::{SiteStrategy, StrategySelector};
