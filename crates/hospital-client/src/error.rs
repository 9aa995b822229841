//! Error types for the records API client

use reqwest::{Method, StatusCode};
use serde::Deserialize;

use crate::session::StoreError;
use crate::token::BearerTokenError;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid API URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// The request never produced a response (connect, timeout, TLS, ...)
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("{method} {url} returned {status}{}", detail_suffix(.detail))]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
        detail: Option<String>,
        body: String,
    },

    /// A 401 could not be recovered because the refresh call itself failed.
    /// The session has been cleared.
    #[error("token refresh failed: {source}")]
    RefreshFailed {
        #[source]
        source: Box<ClientError>,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    InvalidToken(#[from] BearerTokenError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// No access token is stored; the user has to log in first.
    #[error("not logged in, sign in at {login_path}")]
    NotAuthenticated { login_path: String },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::RefreshFailed { source } => source.status(),
            _ => None,
        }
    }

    /// True for a 401 that reached the caller, and for failed refreshes.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            ClientError::Status { status, .. } => *status == StatusCode::UNAUTHORIZED,
            ClientError::RefreshFailed { .. } | ClientError::NotAuthenticated { .. } => true,
            _ => false,
        }
    }

    /// Server supplied `detail` message, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Status { detail, .. } => detail.as_deref(),
            ClientError::RefreshFailed { source } => source.detail(),
            _ => None,
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(": {detail}"))
        .unwrap_or_default()
}

/// Pull the `detail` field out of an error body, if it is JSON and has one.
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.detail)
}
