//! Most recent CSV download, kept so a later `convert` can pick it up.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How long a recorded download is offered for conversion
pub const RECENT_WINDOW_MINUTES: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentDownload {
    pub filename: String,
    pub full_path: PathBuf,
    pub timestamp: DateTime<Utc>,
}

impl RecentDownload {
    pub fn is_recent(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.timestamp) < Duration::minutes(RECENT_WINDOW_MINUTES)
    }
}

/// Single-slot JSON store for the recent download
#[derive(Debug, Clone)]
pub struct RecentDownloadStore {
    path: PathBuf,
}

impl RecentDownloadStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Replace the slot with `download`
    pub fn record(&self, download: &RecentDownload) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(download)
            .context("Failed to serialize recent download")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// Whatever is in the slot, regardless of age
    pub fn load(&self) -> Result<Option<RecentDownload>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let download = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(Some(download))
    }

    /// The recorded download if it is still within the offer window
    pub fn get_recent(&self, now: DateTime<Utc>) -> Result<Option<RecentDownload>> {
        Ok(self.load()?.filter(|d| d.is_recent(now)))
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        }
        Ok(())
    }
}
