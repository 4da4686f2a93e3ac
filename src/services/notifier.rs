// src/services/notifier.rs

//! Chat notification delivery.
//!
//! Messages are split into chunks below the transport's hard cap and each
//! chunk is sent on its own. A failed chunk never stops the rest.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::NotifyConfig;
use crate::utils::http;

pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const CHAT_ID_ENV: &str = "TELEGRAM_CHAT_ID";

/// Bot credentials, read once and passed in explicitly.
#[derive(Clone)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl TelegramCredentials {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Read both values from the environment; `None` unless both are set.
    pub fn from_env() -> Option<Self> {
        let token = std::env::var(BOT_TOKEN_ENV).ok()?;
        let chat = std::env::var(CHAT_ID_ENV).ok()?;
        Self::from_values(&token, &chat)
    }

    fn from_values(token: &str, chat: &str) -> Option<Self> {
        let (token, chat) = (token.trim(), chat.trim());
        if token.is_empty() || chat.is_empty() {
            return None;
        }
        Some(Self::new(token, chat))
    }
}

impl std::fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("bot_token", &"***")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Delivery counts for one message.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NotifyOutcome {
    pub sent: usize,
    pub failed: usize,
}

/// Notification collaborator.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message`, chunked as the transport requires.
    async fn notify(&self, message: &str) -> NotifyOutcome;
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

/// Telegram Bot API notifier.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    credentials: Option<TelegramCredentials>,
    chunk_chars: usize,
}

impl TelegramNotifier {
    /// Without credentials the notifier is disabled and sends nothing.
    pub fn new(config: &NotifyConfig, credentials: Option<TelegramCredentials>) -> Result<Self> {
        Ok(Self {
            client: http::create_api_client(config.timeout_secs)?,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            credentials,
            chunk_chars: config.chunk_chars,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    async fn send_chunk(&self, credentials: &TelegramCredentials, text: &str) -> Result<()> {
        let endpoint = format!("{}/bot{}/sendMessage", self.api_base, credentials.bot_token);
        let payload = SendMessage {
            chat_id: &credentials.chat_id,
            text,
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(&endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::notify(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::notify(format!("status {status}: {body}")));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> NotifyOutcome {
        let mut outcome = NotifyOutcome::default();
        let Some(credentials) = &self.credentials else {
            log::warn!("Telegram credentials missing; notification disabled");
            return outcome;
        };

        let chunks = split_message(message, self.chunk_chars);
        let total = chunks.len();
        for (i, chunk) in chunks.iter().enumerate() {
            match self.send_chunk(credentials, chunk).await {
                Ok(()) => outcome.sent += 1,
                Err(e) => {
                    outcome.failed += 1;
                    log::error!("Notification chunk {}/{} failed: {}", i + 1, total, e);
                }
            }
        }
        log::info!("Notification: {} sent, {} failed", outcome.sent, outcome.failed);
        outcome
    }
}

/// Split `text` into chunks of at most `limit` characters.
///
/// Prefers to cut at the last newline inside the window; the newline itself
/// is dropped. Never splits a code point.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let Some((end, _)) = rest.char_indices().nth(limit) else {
            chunks.push(rest.to_string());
            break;
        };
        let window = &rest[..end];
        let (chunk, next) = match window.rfind('\n') {
            Some(nl) if nl > 0 => (&window[..nl], &rest[nl + 1..]),
            _ => (window, &rest[end..]),
        };
        chunks.push(chunk.to_string());
        rest = next;
    }
    chunks
}
