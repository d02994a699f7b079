//! Decides whether a finished download should be offered for conversion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::recent::RecentDownload;
use super::whitelist::is_url_allowed;
use crate::config::Settings;
use crate::convert::is_csv_name;
use crate::core::base_name;

/// A completed download as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadItem {
    /// Full path of the downloaded file
    pub filename: String,
    #[serde(default)]
    pub mime: Option<String>,
    /// Page the download was started from
    #[serde(default)]
    pub url: Option<String>,
}

impl DownloadItem {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            mime: None,
            url: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// CSV by file name or by MIME type
pub fn is_csv_download(item: &DownloadItem) -> bool {
    let mime_is_csv = item
        .mime
        .as_deref()
        .and_then(|m| m.split(';').next())
        .is_some_and(|m| m.trim().eq_ignore_ascii_case("text/csv"));

    is_csv_name(&item.filename) || mime_is_csv
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    NotCsv,
    AutoNotifyDisabled,
    OriginNotWhitelisted,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::NotCsv => write!(f, "not a CSV download"),
            IgnoreReason::AutoNotifyDisabled => write!(f, "automatic offers are disabled"),
            IgnoreReason::OriginNotWhitelisted => write!(f, "origin is not whitelisted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum DownloadDecision {
    Ignored { reason: IgnoreReason },
    Offer { download: RecentDownload },
}

/// Stateless policy applied to each completed download
#[derive(Debug, Default, Clone, Copy)]
pub struct DownloadObserver;

impl DownloadObserver {
    pub fn new() -> Self {
        Self
    }

    pub fn on_download_complete(
        &self,
        item: &DownloadItem,
        settings: &Settings,
        now: DateTime<Utc>,
    ) -> DownloadDecision {
        if !is_csv_download(item) {
            return DownloadDecision::Ignored {
                reason: IgnoreReason::NotCsv,
            };
        }

        if !settings.auto_notify {
            tracing::debug!("Auto notify disabled, skipping {}", item.filename);
            return DownloadDecision::Ignored {
                reason: IgnoreReason::AutoNotifyDisabled,
            };
        }

        if !is_url_allowed(
            item.url.as_deref(),
            &settings.whitelist_urls,
            settings.include_subdomains,
        ) {
            tracing::debug!("Origin {:?} not in whitelist", item.url);
            return DownloadDecision::Ignored {
                reason: IgnoreReason::OriginNotWhitelisted,
            };
        }

        tracing::info!("CSV download detected: {}", item.filename);
        DownloadDecision::Offer {
            download: RecentDownload {
                filename: base_name(&item.filename).to_string(),
                full_path: PathBuf::from(&item.filename),
                timestamp: now,
            },
        }
    }
}
