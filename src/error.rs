//! Error types for dataequiv operations

use crate::report::ComparisonReport;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DataEquivError>;

#[derive(Error, Debug)]
pub enum DataEquivError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{report}")]
    NotEquivalent { report: ComparisonReport },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DataEquivError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn not_equivalent(report: ComparisonReport) -> Self {
        Self::NotEquivalent { report }
    }
}
