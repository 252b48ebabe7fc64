//! Error types for configuration, result store and export operations.

use std::path::PathBuf;

use prompt_harness_core::ConfigError;
use thiserror::Error;

/// Errors that can occur while loading configuration or persisting results.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A result log line could not be parsed.
    #[error("malformed result log {}: line {line}: {reason}", path.display())]
    MalformedLog {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// A result with the same id is already stored.
    #[error("duplicate test id: {0}")]
    DuplicateId(String),

    /// A prompt framework file could not be read.
    #[error("cannot read prompt framework {}: {source}", path.display())]
    FrameworkUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A merged scoring profile failed validation.
    #[error("invalid {kind} profile: {}", join_errors(errors))]
    InvalidProfile {
        kind: String,
        errors: Vec<ConfigError>,
    },

    /// The store lock was poisoned by a panicking writer.
    #[error("result store lock poisoned")]
    LockPoisoned,
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias for results with [`DatabaseError`].
pub type Result<T> = std::result::Result<T, DatabaseError>;
