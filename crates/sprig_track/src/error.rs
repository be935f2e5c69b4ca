//! Tracking console error types

use std::path::PathBuf;

use sprig_core::{BusError, CoreError};
use sprig_style::StyleError;
use thiserror::Error;

/// Errors raised by the tracking components and their collaborators
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The login request could not be sent or its reply not read
    #[error("Login request failed: {0}")]
    Network(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Style(#[from] StyleError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for tracking console operations
pub type Result<T> = std::result::Result<T, TrackError>;
