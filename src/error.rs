//! error types
//!
//! structured errors for config, transport, json, and graphql responses.

use crate::graphql::GraphQlError;
use std::fmt;

/// library result type
pub type Result<T> = std::result::Result<T, Error>;

/// error type for the gateway client
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// invalid or missing configuration, raised before any request is sent
    #[error("config error: {0}")]
    Config(String),

    /// network-level failure (dns, connection refused, timeout, body read)
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// a success body that was not json, or whose data did not fit the requested type
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// the gateway answered with a non-success http status
    #[error("transport error: http status {status}")]
    Transport {
        /// http status code
        status: u16,
        /// parsed response body, or the raw text as a json string if it was not json
        body: serde_json::Value,
    },

    /// the request succeeded but the response carried graphql errors
    #[error("graphql error: {message}")]
    GraphQl {
        /// http status of the response
        status: u16,
        /// graphql error list
        errors: Vec<GraphQlError>,
        /// partial data returned alongside the errors, if any
        data: Option<serde_json::Value>,
        /// first error message
        message: String,
    },

    /// a paginated walk could not make progress
    #[error("pagination error: {0}")]
    Pagination(String),

    /// a convenience call needed `data` and the response had none
    #[error("response carried no data for {0}")]
    MissingData(String),
}

impl Error {
    /// true if the error looks like an auth failure
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Transport { status: 401 | 403, .. })
    }

    /// http status carried by the error, if any
    ///
    /// network failures never carry one; the status is only read once a
    /// response arrives.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } | Error::GraphQl { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for GraphQlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
