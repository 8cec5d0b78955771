//! Error types for the nutrilog_core library.

use crate::extract::ExtractionError;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for nutrilog_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A persisted snapshot could not be decoded
    #[error("Corrupt state: {0}")]
    CorruptState(String),

    /// Profile input rejected during onboarding
    #[error("Invalid profile: {0}")]
    Validation(String),

    /// The extraction service did not produce a usable analysis
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// An operation needs a profile and none has been set up
    #[error("No profile found. Run `nutrilog profile set` first.")]
    NoProfile,

    /// Another analysis holds the gate for this data directory
    #[error("An analysis is already in progress")]
    AnalysisInProgress,

    /// Generic error
    #[error("{0}")]
    Other(String),
}
