//! Style pipeline error types

use thiserror::Error;

use crate::parser::ParseError;

/// Errors that can occur while acquiring a stylesheet
#[derive(Error, Debug)]
pub enum StyleError {
    /// The source could not deliver the stylesheet body
    #[error("Failed to fetch stylesheet '{locator}': {reason}")]
    Fetch { locator: String, reason: String },

    /// The source answered with a non-success status
    #[error("Stylesheet '{locator}' returned status {status}")]
    Status { locator: String, status: u16 },

    /// Nothing exists at the locator
    #[error("Stylesheet not found: {0}")]
    NotFound(String),

    /// The locator cannot be resolved by this source
    #[error("Invalid stylesheet locator '{0}'")]
    InvalidLocator(String),

    /// The body was fetched but is not a valid stylesheet
    #[error("Failed to parse stylesheet '{locator}': {source}")]
    Parse {
        locator: String,
        #[source]
        source: ParseError,
    },
}

impl StyleError {
    /// The locator the failed operation was working on
    pub fn locator(&self) -> &str {
        match self {
            StyleError::Fetch { locator, .. }
            | StyleError::Status { locator, .. }
            | StyleError::Parse { locator, .. } => locator,
            StyleError::NotFound(locator) | StyleError::InvalidLocator(locator) => locator,
        }
    }
}

/// Result type for style operations
pub type Result<T> = std::result::Result<T, StyleError>;
