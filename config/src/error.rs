//! Error types for document loading.

use std::path::PathBuf;

use argrules_core::ParseError;
use thiserror::Error;

/// Errors that can occur while loading a document or applying it to a
/// parser.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON syntax error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML syntax error.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// INI syntax error.
    #[error("INI error on line {line}: {message}")]
    IniError { line: usize, message: String },

    /// The document root is not a key/value mapping.
    #[error("document root must be a mapping, found {0}")]
    NotAMapping(&'static str),

    /// The file extension does not name a known format.
    #[error("unsupported document format: {}", .0.display())]
    UnknownFormat(PathBuf),

    /// The merged document was rejected by the parser.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
