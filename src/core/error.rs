//! Error types for the ripple library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using ripple's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during debt analysis.
///
/// Only `InvariantViolation` is fatal to a run; every other kind is absorbed
/// into locally-degraded output and counted by the owning stage.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A source file could not be read; the scanner skips it.
    #[error("Unreadable file: {path}")]
    UnreadableFile { path: PathBuf },

    /// Unsupported language for the given file.
    #[error("Unsupported language for file: {path}")]
    UnsupportedLanguage { path: PathBuf },

    /// Parse error from tree-sitter; the analyzer skips the file.
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// VCS metadata is unavailable; callers fall back to sentinel metadata.
    #[error("VCS unavailable: {0}")]
    VcsUnavailable(String),

    /// The classifier endpoint signaled a rate limit.
    #[error("Classifier rate limited: {0}")]
    ClassifierRateLimit(String),

    /// A classifier call exceeded its deadline.
    #[error("Classifier timed out after {seconds}s")]
    ClassifierTimeout { seconds: u64 },

    /// Any other classifier failure; treated as a negative classification.
    #[error("Classifier error: {0}")]
    Classifier(String),

    /// An internal invariant was violated. Aborts the run.
    #[error("Invariant violation in {stage}: {message}")]
    InvariantViolation {
        stage: &'static str,
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Create a new VCS-unavailable error.
    pub fn vcs(message: impl Into<String>) -> Self {
        Self::VcsUnavailable(message.into())
    }

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new classifier error.
    pub fn classifier(message: impl Into<String>) -> Self {
        Self::Classifier(message.into())
    }

    /// Create an invariant-violation error for the named stage.
    pub fn invariant(stage: &'static str, message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            stage,
            message: message.into(),
        }
    }

    /// Whether this error aborts the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }
}
