//! Error types for manifest loading and validation.

use thiserror::Error;

/// Errors that can occur while reading, writing or checking a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The file extension names no known format.
    #[error("unsupported manifest format: {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),

    /// Structural problem in the manifest itself.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),
}

/// Convenience alias for results with [`ManifestError`].
pub type Result<T> = std::result::Result<T, ManifestError>;
