//! Error types for engine construction
//!
//! Only configuration and table-validation problems are errors. Noisy input
//! never fails a canonicalization pass: per-field problems are recorded as
//! [`crate::validate::RejectReason`] values instead.

use thiserror::Error;

/// Main error type for the canonicalization engine
#[derive(Error, Debug)]
pub enum CanonError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Invalid regex in {context}: {source}")]
    InvalidRegex {
        context: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid mapping rule #{index} ({pattern}): {message}")]
    InvalidRule {
        index: usize,
        pattern: String,
        message: String,
    },

    #[error("Invalid composite recipe '{kind}': {message}")]
    InvalidRecipe { kind: String, message: String },

    #[error("Invalid fallback pattern for '{key}': {message}")]
    InvalidFallback { key: String, message: String },

    #[error("Invalid vocabulary '{name}': {message}")]
    InvalidVocabulary { name: String, message: String },

    #[error("Invalid confidence parameter '{name}': {value} is outside [0, 1]")]
    InvalidConfidence { name: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, CanonError>;

impl CanonError {
    pub(crate) fn regex(context: impl Into<String>, source: regex::Error) -> Self {
        CanonError::InvalidRegex {
            context: context.into(),
            source,
        }
    }
}
