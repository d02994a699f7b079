/*!
# Error System for the CSV converter

Errors scoped to a single conversion attempt. None of them are fatal to the
process; callers surface them to the user and move on to the next file.
*/

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result of a single conversion step
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Failure of one conversion attempt
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Failed to read file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Only CSV files are supported: {0}")]
    NotCsv(String),
}

impl ConvertError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Severity shown to the user for this failure
    pub fn level(&self) -> StatusLevel {
        match self {
            ConvertError::NotCsv(_) => StatusLevel::Warning,
            ConvertError::Read { .. } | ConvertError::Write { .. } => StatusLevel::Error,
        }
    }
}

/// Severity of a user-facing status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLevel::Success => write!(f, "SUCCESS"),
            StatusLevel::Info => write!(f, "INFO"),
            StatusLevel::Warning => write!(f, "WARNING"),
            StatusLevel::Error => write!(f, "ERROR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_message() {
        let err = ConvertError::read(
            "missing.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().contains("missing.csv"));
        assert_eq!(err.level(), StatusLevel::Error);
    }

    #[test]
    fn test_not_csv_is_warning() {
        let err = ConvertError::NotCsv("report.xlsx".to_string());
        assert_eq!(err.level(), StatusLevel::Warning);
        assert_eq!(err.to_string(), "Only CSV files are supported: report.xlsx");
    }
}
