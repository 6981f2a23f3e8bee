//! Error types for the capnp-msg-gen crate.

use std::path::PathBuf;

/// Errors that can occur while parsing a schema or generating artifacts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The IDL source could not be parsed.
    #[error("schema parse error: {0}")]
    Parse(String),

    /// Failed to read a file from disk.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a generated artifact.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON serialization error.
    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Artifact generation error.
    #[error("codegen error: {0}")]
    Codegen(String),
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
