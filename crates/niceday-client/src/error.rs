//! # Error Module
//!
//! One error type for every client operation.

use thiserror::Error;

/// Errors from the niceday client.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// niceday-api answered with a non-success status code.
    #[error("HTTP status {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// niceday-api answered with a body that is not JSON.
    #[error("The niceday-api did not return JSON.")]
    NotJson,

    /// niceday-api relayed an error from the niceday server.
    #[error("{0}")]
    Server(String),

    /// The payload is JSON but lacks data we rely on.
    #[error("Unexpected data from niceday-api: {0}")]
    UnexpectedData(String),

    /// Only GET and POST are implemented.
    #[error("HTTP method {0} is not implemented")]
    UnsupportedMethod(String),

    /// The caller passed arguments that cannot form a valid request.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Client configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
