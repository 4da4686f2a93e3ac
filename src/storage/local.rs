//! Local filesystem storage implementation.
//!
//! Every write goes to a temporary sibling first and is renamed into
//! place, so an interrupted run never leaves a half-written state file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{NoveltyState, RunStorage};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    state_key: String,
}

impl LocalStorage {
    /// Create a LocalStorage rooted at `root_dir` keeping state in `state_key`.
    pub fn new(root_dir: impl Into<PathBuf>, state_key: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            state_key: state_key.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl RunStorage for LocalStorage {
    async fn load_state(&self) -> Result<Option<NoveltyState>> {
        let Some(bytes) = self
            .read_bytes(&self.state_key)
            .await
            .map_err(|e| AppError::state(format!("{}: {e}", self.state_key)))?
        else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| AppError::state(format!("{}: {e}", self.state_key)))
    }

    async fn save_state(&self, state: &NoveltyState) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(state)?;
        self.write_bytes(&self.state_key, &bytes).await?;
        log::info!(
            "State saved: {} ({} identities)",
            self.path(&self.state_key).display(),
            state.len()
        );
        Ok(())
    }

    async fn write_export(&self, name: &str, content: &str) -> Result<()> {
        self.write_bytes(name, content.as_bytes()).await?;
        log::info!("Export saved: {}", self.path(name).display());
        Ok(())
    }
}
