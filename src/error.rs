//! Error types for Solidafy Pager
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

use crate::types::MAX_PAGE_SIZE;

/// The main error type for Solidafy Pager
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Request Validation Errors
    // ============================================================================
    /// The cursor token could not be decoded. The message is deliberately
    /// opaque and never says which decode step failed.
    #[error("Invalid cursor.")]
    InvalidCursor,

    #[error("Invalid limit '{value}': must be an integer between 0 and {max}", max = MAX_PAGE_SIZE)]
    InvalidLimit { value: String },

    // ============================================================================
    // Pagination Errors
    // ============================================================================
    #[error("Cursor offset {offset} exceeds maximum of {max}")]
    OffsetOverflow { offset: u32, max: u32 },

    #[error("Record is missing ordering field '{field}'")]
    MissingField { field: String },

    #[error("Invalid identifier '{name}'")]
    InvalidIdentifier { name: String },

    // ============================================================================
    // Record Source Errors
    // ============================================================================
    #[error("Record source error: {message}")]
    Source { message: String },

    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("Collection '{name}' not found")]
    CollectionNotFound { name: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

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

    /// Create a record source error
    pub fn record_source(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(name: impl Into<String>) -> Self {
        Self::InvalidIdentifier { name: name.into() }
    }

    /// Create an invalid limit error
    pub fn invalid_limit(value: impl ToString) -> Self {
        Self::InvalidLimit {
            value: value.to_string(),
        }
    }

    /// Create a collection not found error
    pub fn collection_not_found(name: impl Into<String>) -> Self {
        Self::CollectionNotFound { name: name.into() }
    }

    /// Check if this error is a request-validation failure rather than a
    /// server fault
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidCursor | Error::InvalidLimit { .. })
    }

    /// Name of the request field a validation error refers to
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Error::InvalidCursor => Some("cursor"),
            Error::InvalidLimit { .. } => Some("limit"),
            _ => None,
        }
    }
}

/// Result type alias for Solidafy Pager
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }
}
