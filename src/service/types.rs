//! Message types exchanged between a UI layer and the conversion service

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::config::{Settings, SettingsPatch};
use crate::convert::{ConversionOutcome, ConversionReport};
use crate::core::{ConvertError, StatusLevel};
use crate::downloads::{DownloadDecision, DownloadItem, RecentDownload};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("No recent CSV download to convert")]
    NoRecentDownload,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    pub fn storage(err: anyhow::Error) -> Self {
        Self::Storage(format!("{:#}", err))
    }

    pub fn level(&self) -> StatusLevel {
        match self {
            ServiceError::Convert(e) => e.level(),
            ServiceError::NoRecentDownload => StatusLevel::Warning,
            ServiceError::Storage(_) => StatusLevel::Error,
        }
    }
}

/// Requests understood by [`super::ConversionService`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    GetRecentDownload,
    ClearRecentDownload,
    GetSettings,
    UpdateSettings { settings: SettingsPatch },
    DownloadCompleted { item: DownloadItem },
    ConvertFile { path: PathBuf },
    ConvertRecent,
}

/// Post-conversion notification content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    /// Notification for a finished conversion, if the user asked for them
    pub fn for_report(settings: &Settings, report: &ConversionReport) -> Option<Self> {
        if !settings.show_notifications {
            return None;
        }
        match &report.outcome {
            ConversionOutcome::Converted { output_name, .. } => Some(Self {
                title: "Conversion complete".to_string(),
                message: format!("{} was created", output_name),
            }),
            ConversionOutcome::AlreadyMarked => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    RecentDownload {
        download: Option<RecentDownload>,
    },
    Settings {
        settings: Settings,
    },
    Success,
    Decision {
        decision: DownloadDecision,
    },
    Converted {
        report: ConversionReport,
        notification: Option<Notification>,
    },
    Error {
        message: String,
        level: StatusLevel,
    },
}

impl From<ServiceError> for Response {
    fn from(err: ServiceError) -> Self {
        Response::Error {
            level: err.level(),
            message: err.to_string(),
        }
    }
}
