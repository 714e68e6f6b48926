//! Error types shared across the library

use thiserror::Error;

/// Failure of a page fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connectivity failure (DNS, refused connection, timeout)
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response from the backend
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },

    /// Response body did not match the page contract
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Base URL or endpoint could not be parsed
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// HTTP status codes worth offering a retry for
const RETRYABLE_STATUS_CODES: &[u16] = &[
    408, // Request Timeout
    429, // Too Many Requests
    500, // Internal Server Error
    502, // Bad Gateway
    503, // Service Unavailable
    504, // Gateway Timeout
];

impl FetchError {
    /// Whether a retry affordance makes sense for this failure
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Http { status, .. } => RETRYABLE_STATUS_CODES.contains(status),
            FetchError::Decode(_) | FetchError::InvalidUrl(_) => false,
        }
    }

    /// HTTP status, if the failure came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for FetchError {
    fn from(err: url::ParseError) -> Self {
        FetchError::InvalidUrl(err.to_string())
    }
}

/// Configuration load/save failure
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Viewport observer could not be installed
#[derive(Debug, Error)]
pub enum ObserverError {
    /// The host cannot report visibility (headless, no runtime)
    #[error("viewport observation unsupported: {0}")]
    Unsupported(String),
}
