//! Error types for dissolve-rs.

use thiserror::Error;

/// The main error type for dissolve-rs operations.
///
/// Every variant is a configuration or programming error raised while building a
/// scene. None of them are transient, so callers should abort the build rather than
/// retry or fall back to a partially composed material.
#[derive(Error, Debug)]
pub enum DissolveError {
    /// A splice anchor was requested that the resolved base source does not contain.
    #[error("splice anchor '{anchor}' not present in base template '{template}'")]
    UnknownSpliceAnchor { anchor: String, template: String },

    /// A splice key string does not name any known splice anchor.
    #[error("unrecognized splice key '{0}'")]
    UnrecognizedSpliceKey(String),

    /// The base template is unknown or its sources are malformed.
    #[error("invalid base template: {0}")]
    InvalidBaseTemplate(String),

    /// Geometry does not satisfy the non-indexed triangle-list precondition.
    #[error("incompatible geometry: {0}")]
    IncompatibleGeometry(String),

    /// A uniform with the given name was not found on the material.
    #[error("uniform '{0}' not found")]
    UniformNotFound(String),

    /// A uniform value has a different type than the operation requires.
    #[error("uniform '{name}' has type {actual}, expected {expected}")]
    UniformTypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Configuration values are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for dissolve-rs operations.
pub type Result<T> = std::result::Result<T, DissolveError>;
