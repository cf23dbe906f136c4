//! Error types for Chatkeep
//!
//! This module defines the error types used by the fallible plumbing of the
//! crate (configuration, backends, cookie jar, HTTP client), using
//! `thiserror` for ergonomic error handling.
//!
//! The conversation store and the sync manager never surface these errors to
//! their callers; they log them and leave a consistent state behind.

use thiserror::Error;

/// Main error type for Chatkeep operations
#[derive(Error, Debug)]
pub enum ChatkeepError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key-value persistence errors (backend open, read, write, flush)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Cookie jar errors (identity registry, anonymous session)
    #[error("Cookie error: {0}")]
    Cookie(String),

    /// Remote history sync errors (non-success status, unusable body)
    #[error("Sync error: {0}")]
    Sync(String),

    /// No conversation with the given id
    #[error("Conversation not found: {0}")]
    NotFound(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Chatkeep operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
