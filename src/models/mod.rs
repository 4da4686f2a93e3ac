// src/models/mod.rs

//! Domain models for the monitor.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod candidate;
mod config;

// Re-export all public types
pub use candidate::{
    Candidate, CandidateId, Classification, DEDUP_TITLE_CHARS, IDENTITY_HEX_LEN,
    MAX_TITLE_GRAPHEMES, normalize_title,
};
pub use config::{
    Config, ExportConfig, ExtractionConfig, FetchConfig, NotifyConfig, PathsConfig, SiteRule,
    StrategyKind, TRANSPORT_MESSAGE_CAP, TaxonomyConfig,
};
