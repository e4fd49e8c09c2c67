//! Error types shared across the crate.
//!
//! Validation problems are *not* errors: they accumulate in a
//! [`ValidationResult`](crate::config::ValidationResult). The enums here cover
//! the failures that abort an operation.

use std::path::PathBuf;

/// Errors raised while constructing or loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown key '{key}' in config group '{group}'")]
    UnknownKey { group: String, key: String },

    #[error("Key '{key}' expects a {expected} value, found {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: String,
    },

    #[error("Configuration is invalid:\n{0}")]
    Invalid(String),

    #[error("Cannot set doc_metadata as it has already been set")]
    MetadataAlreadySet,

    #[error("Failed to read configuration '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration '{path}': {message}")]
    Parse { path: PathBuf, message: String },
}

/// Structural errors that abort building a network.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("Missing or malformed header row, expected '{expected}', found '{found}'")]
    MissingHeader { expected: String, found: String },

    #[error("Malformed row on line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("Duplicate node ID: {0}")]
    DuplicateNode(String),

    #[error("Node '{from}' references non-existent node '{to}'")]
    UnknownConnection { from: String, to: String },

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Entry node '{0}' does not exist in the network")]
    UnknownEntryNode(String),

    #[error("Placement policy cannot be applied: {0}")]
    InvalidPolicy(String),

    #[error("Network input is not a JSON encoded string: {0}")]
    InvalidEncoding(String),

    #[error("Failed to read network file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Short description of a JSON value's type for error messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> String {
    use serde_json::Value;

    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("bool ({b})"),
        Value::Number(n) => format!("number ({n})"),
        Value::String(s) => format!("string (\"{s}\")"),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}
