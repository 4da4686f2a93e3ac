// src/config.rs

//! Run input loading.
//!
//! Everything here happens before the first request: a missing URL list
//! or missing credentials stop the run without touching the network.

use std::fs;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::services::{BOT_TOKEN_ENV, CHAT_ID_ENV, TelegramCredentials};

/// Parse a newline-delimited URL list, skipping blanks and `#` comments.
pub fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Load the URL list; a missing file is a configuration error.
pub fn load_url_list(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(AppError::config(format!("URL list not found: {}", path.display())));
    }
    let content = fs::read_to_string(path)?;
    Ok(parse_url_list(&content))
}

/// Load configuration from a TOML file and validate it.
///
/// Falls back to defaults if the file is missing or unreadable.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        Config::load_or_default(path)
    } else {
        log::info!("No config at {}, using defaults", path.display());
        Config::default()
    };
    config.validate()?;
    Ok(config)
}

/// Validated inputs of a run.
#[derive(Debug)]
pub struct RunInputs {
    pub urls: Vec<String>,
    pub credentials: Option<TelegramCredentials>,
}

/// Check the URL list and credentials before any network activity.
pub fn preflight(
    url_list: &Path,
    credentials: Option<TelegramCredentials>,
    require_credentials: bool,
) -> Result<RunInputs> {
    if require_credentials && credentials.is_none() {
        return Err(AppError::config(format!(
            "{BOT_TOKEN_ENV} and {CHAT_ID_ENV} must be set (or use --no-notify)"
        )));
    }

    let urls = load_url_list(url_list)?;
    if urls.is_empty() {
        log::warn!("URL list {} contains no URLs", url_list.display());
    }
    Ok(RunInputs { urls, credentials })
}
