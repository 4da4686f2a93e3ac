// src/error.rs

//! Unified error handling for the monitor.

use std::fmt;

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Taxonomy regex failed to compile
    #[error("Invalid pattern in '{group}': {source}")]
    Pattern {
        group: String,
        #[source]
        source: regex::Error,
    },

    /// Missing URL list, credentials or unusable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or HTTP status failure for one source
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Response body too short to contain any postings
    #[error("Empty response from {url} ({bytes} bytes)")]
    EmptyBody { url: String, bytes: usize },

    /// A single extraction block could not be parsed
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    /// Persisted novelty state unreadable or unwritable
    #[error("State error: {0}")]
    State(String),

    /// Notification transport failure for one chunk
    #[error("Notify error: {0}")]
    Notify(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a fetch error for a URL.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a parse error with context.
    pub fn parse(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a state error.
    pub fn state(message: impl fmt::Display) -> Self {
        Self::State(message.to_string())
    }

    /// Create a notification error.
    pub fn notify(message: impl fmt::Display) -> Self {
        Self::Notify(message.to_string())
    }

    /// Whether this error aborts the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Pattern { .. } | Self::Selector { .. } | Self::Toml(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_configuration_errors_are_fatal() {
        assert!(AppError::config("missing job_urls.txt").is_fatal());
        assert!(!AppError::fetch("https://x.test", "timeout").is_fatal());
        assert!(!AppError::parse("ld+json block 1", "eof").is_fatal());
        assert!(!AppError::state("corrupt").is_fatal());
        assert!(!AppError::notify("502").is_fatal());
    }

    #[test]
    fn fetch_error_names_the_url() {
        let err = AppError::fetch("https://x.test/jobs", "status 503");
        assert_eq!(
            err.to_string(),
            "Fetch error for https://x.test/jobs: status 503"
        );
    }
}
