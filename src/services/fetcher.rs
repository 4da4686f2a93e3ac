// src/services/fetcher.rs

//! Page fetching.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::FetchConfig;
use crate::utils::http;

/// Source of page bodies.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` and return the decoded body.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetcher backed by a shared `reqwest` client with the browser header profile.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_client(config)?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?
            .error_for_status()
            .map_err(|e| AppError::fetch(url, e))?;

        response.text().await.map_err(|e| AppError::fetch(url, e))
    }
}

/// Reject bodies too short to hold any posting.
///
/// Some sites answer unknown clients with an empty 200; that is a soft
/// failure for the source, not a crash.
pub fn check_body(url: &str, body: String, min_bytes: usize) -> Result<String> {
    let bytes = body.trim().len();
    if bytes < min_bytes {
        return Err(AppError::EmptyBody {
            url: url.to_string(),
            bytes,
        });
    }
    Ok(body)
}
