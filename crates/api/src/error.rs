//! Error type for Port API calls.

use serde_json::Value;
use thiserror::Error;

/// Errors produced by [`crate::PortClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid PORT_API_BASE URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("missing Port credentials; set PORT_CLIENT_ID and PORT_CLIENT_SECRET")]
    MissingCredentials,

    #[error("authentication response did not include an access token")]
    MissingAccessToken,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid JSON in response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("async runtime error: {0}")]
    Runtime(String),
}

impl ApiError {
    /// HTTP status code when the remote answered with a non-success response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(error) => error.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Raw error details suitable for embedding in a step outcome.
    ///
    /// HTTP bodies are returned as parsed JSON when possible so callers can
    /// inspect Port's own error payload.
    pub fn details(&self) -> Value {
        match self {
            Self::Http { body, .. } => serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.clone())),
            other => Value::String(other.to_string()),
        }
    }
}
