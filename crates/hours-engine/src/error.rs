//! Error types for hours-engine operations.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum HoursError {
    /// A period, rule, or time span cannot be interpreted.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The query date range is inverted or longer than the allowed maximum.
    #[error("Range error: {0}")]
    Range(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

pub type Result<T> = std::result::Result<T, HoursError>;
