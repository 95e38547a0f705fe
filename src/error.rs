// src/error.rs

//! Unified error handling for repowatch.

use std::fmt;

use thiserror::Error;

/// Result type alias for repowatch operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Upstream answered with a body of the wrong shape
    #[error("Unexpected response from {url}: {message}")]
    Response { url: String, message: String },

    /// A projection rule could not be applied to a raw record
    #[error("Projection of field '{field}' failed: {message}")]
    Projection { field: String, message: String },

    /// Filter expression could not be parsed
    #[error("Filter error at {position}: {message}")]
    Filter { position: usize, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an unexpected-response error.
    pub fn response(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Response {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a projection error for a field.
    pub fn projection(field: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Projection {
            field: field.into(),
            message: message.to_string(),
        }
    }

    /// Create a filter parse error.
    pub fn filter(position: usize, message: impl fmt::Display) -> Self {
        Self::Filter {
            position,
            message: message.to_string(),
        }
    }
}
