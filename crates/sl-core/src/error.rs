//! Error types for sl-core

use thiserror::Error;

/// Core error type for Swapline
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: IO error with file path context
    #[error("[E004] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// R001: Identifier cannot be rendered safely. Always a caller bug.
    #[error("[R001] Invalid identifier '{identifier}': {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    /// R002: Catalog reported a different object type than expected
    #[error("[R002] Schema mismatch for {relation}: expected {expected}, catalog reports '{found}'")]
    SchemaMismatch {
        relation: String,
        expected: String,
        found: String,
    },

    /// R004: Catalog placed the live object somewhere other than asked
    #[error("[R004] Location mismatch for {relation}: expected {expected}, catalog reports {found}")]
    LocationMismatch {
        relation: String,
        expected: String,
        found: String,
    },

    /// R003: Rendered model node is malformed
    #[error("[R003] Invalid model node '{model}': {message}")]
    ConfigValidation { model: String, message: String },

    /// Schema/YAML parse error
    #[error("YAML error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
