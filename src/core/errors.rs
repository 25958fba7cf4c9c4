//! Custom error types for translation operations

use std::fmt;

use thiserror::Error;

/// Translation-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// Input rejected by the client or by the server (HTTP 400)
    #[error("Validation error: {message}")]
    ValidationError {
        /// Error description
        message: String,
        /// Offending position inside a batch, when known
        index: Option<usize>,
    },

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded. Retry after {retry_after:?} seconds")]
    RateLimitError {
        /// Seconds to wait before retrying, when the server says
        retry_after: Option<u64>,
    },

    /// API request failed or the payload reported `success: false`
    #[error("{message}")]
    ApiError {
        /// HTTP status, when a response was received
        status: Option<u16>,
        /// Error description
        message: String,
    },

    /// Timeout, connection failure or any other transport problem
    #[error("Network error: {message}")]
    NetworkError {
        /// Error description
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Error description
        message: String,
    },
}

/// Coarse classification of a [`TranslationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// [`TranslationError::ValidationError`]
    Validation,
    /// [`TranslationError::RateLimitError`]
    RateLimit,
    /// [`TranslationError::ApiError`]
    Api,
    /// [`TranslationError::NetworkError`]
    Network,
    /// [`TranslationError::ConfigError`]
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::RateLimit => write!(f, "rate_limit"),
            ErrorKind::Api => write!(f, "api"),
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::Config => write!(f, "config"),
        }
    }
}

impl TranslationError {
    /// Client-side validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        TranslationError::ValidationError {
            message: message.into(),
            index: None,
        }
    }

    /// Validation failure pinned to one batch item
    pub fn validation_at(index: usize, message: impl Into<String>) -> Self {
        TranslationError::ValidationError {
            message: message.into(),
            index: Some(index),
        }
    }

    /// API failure without an HTTP status
    pub fn api(message: impl Into<String>) -> Self {
        TranslationError::ApiError {
            status: None,
            message: message.into(),
        }
    }

    /// Which of the error families this belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslationError::ValidationError { .. } => ErrorKind::Validation,
            TranslationError::RateLimitError { .. } => ErrorKind::RateLimit,
            TranslationError::ApiError { .. } => ErrorKind::Api,
            TranslationError::NetworkError { .. } => ErrorKind::Network,
            TranslationError::ConfigError { .. } => ErrorKind::Config,
        }
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "Request timeout".to_string()
        } else if err.is_connect() {
            "Connection error".to_string()
        } else {
            format!("Network error: {}", err)
        };
        TranslationError::NetworkError { message }
    }
}

impl From<anyhow::Error> for TranslationError {
    fn from(err: anyhow::Error) -> Self {
        TranslationError::ConfigError {
            message: err.to_string(),
        }
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;
