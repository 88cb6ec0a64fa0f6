//! Error types for the Pokedex bridge
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for the Pokedex bridge
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Fetch Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Too many requests for {url} after {retries} retries, try an incremental refresh later")]
    TooManyRequests { url: String, retries: u32 },

    #[error("JSON fetch failed for {url}: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("Malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    #[error("Request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Cache Errors
    // ============================================================================
    #[error("Persistence failure: {message}")]
    Persistence { message: String },

    // ============================================================================
    // Connector Errors
    // ============================================================================
    #[error("Table '{table}' not found")]
    TableNotFound { table: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a terminal fetch error
    pub fn request_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RequestFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Create a table not found error
    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }

    /// Check if this error came from upstream rate limiting
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::TooManyRequests { .. })
    }

    /// Check if this error is a persistence failure (never fatal to a run)
    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Persistence { .. })
    }
}

/// Result type alias for the Pokedex bridge
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
