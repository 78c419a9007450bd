//! Error types for the Hemmer Terraform bridge.

use thiserror::Error;

/// Result alias used throughout the bridge.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur while converting, diffing or rewriting schemas.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A schema path could not be resolved against a schema or type.
    #[error("{path}: {message}")]
    SchemaPath {
        /// The path prefix at which traversal failed.
        path: String,
        /// What went wrong at that prefix.
        message: String,
    },

    /// A schema path could not be encoded or decoded.
    #[error("Invalid schema path: {0}")]
    InvalidPath(String),

    /// A property value did not match the shape the schema expects.
    #[error("{}", prefixed(.path, .message))]
    Conversion {
        /// The property path of the offending value (may be empty at the root).
        path: String,
        /// What went wrong.
        message: String,
    },

    /// The provider or package schema is internally inconsistent.
    #[error("Schema error: {0}")]
    Schema(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A type reference could not be resolved.
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// A runtime operation was called on a schema-only adapter.
    #[error("Unsupported operation: {op} is not available on {adapter} schemas")]
    Unsupported {
        /// The operation that was attempted.
        op: &'static str,
        /// The adapter that does not support it.
        adapter: &'static str,
    },

    /// A diff could not be computed or applied.
    #[error("Diff error: {0}")]
    Diff(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn prefixed(path: &str, message: &str) -> String {
    if path.is_empty() {
        message.to_string()
    } else {
        format!("{}: {}", path, message)
    }
}

impl BridgeError {
    /// Create a conversion error at the root of a value.
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            path: String::new(),
            message: message.into(),
        }
    }

    /// Create a schema path error.
    pub fn schema_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Prefix a conversion error with the name of the enclosing property.
    ///
    /// Index segments (`[0]`) are appended without a dot so nested errors read
    /// as `rules[0].port`. Other variants are returned unchanged.
    pub fn with_context(self, segment: &str) -> Self {
        match self {
            Self::Conversion { path, message } => {
                let path = if path.is_empty() {
                    segment.to_string()
                } else if path.starts_with('[') {
                    format!("{}{}", segment, path)
                } else {
                    format!("{}.{}", segment, path)
                };
                Self::Conversion { path, message }
            },
            other => other,
        }
    }

    /// Get the error message without its path prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::SchemaPath { message, .. } => message,
            Self::InvalidPath(msg) => msg,
            Self::Conversion { message, .. } => message,
            Self::Schema(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::UnknownType(msg) => msg,
            Self::Unsupported { op, .. } => op,
            Self::Diff(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
        }
    }

    /// The property or schema path attached to this error, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::SchemaPath { path, .. } | Self::Conversion { path, .. } => Some(path),
            _ => None,
        }
    }
}
