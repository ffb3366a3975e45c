//! Error types for schema composition and compilation

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema composition and compilation errors.
///
/// Document problems never surface here: they are reported as
/// [`ValidationResult`](crate::ValidationResult)s. These errors describe a
/// broken schema source and are fatal for whoever builds the registry.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema fragment directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Failed to parse schema fragment '{name}': {reason}")]
    FragmentParse { name: String, reason: String },

    #[error("Duplicate schema fragment '{name}' ({first} and {second})")]
    DuplicateFragment {
        name: String,
        first: String,
        second: String,
    },

    #[error("No schema fragments found in {0}")]
    NoFragments(String),

    #[error("Dangling reference in '{from}': '{target}' is not a known definition")]
    DanglingReference { from: String, target: String },

    #[error("Root type '{0}' is not a known definition")]
    MissingRootType(String),

    #[error("Unknown schema keyword '{keyword}' at {path}")]
    UnknownKeyword { keyword: String, path: String },

    #[error("Invalid schema at {path}: {reason}")]
    NotASchema { path: String, reason: String },

    #[error("Failed to compile schema for {target}: {reason}")]
    Compile { target: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
