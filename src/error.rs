//! Error types surfaced by the client.

use thiserror::Error;

/// Transport-level failure: the request never produced an HTTP status.
#[derive(Debug, Error)]
pub enum TransportFault {
    /// Connect, read or overall timeout elapsed
    #[error("request timed out: {0}")]
    Timeout(String),
    /// TCP/TLS connection could not be established
    #[error("connection failed: {0}")]
    Connect(String),
    /// Response body could not be read to completion
    #[error("failed to read response body: {0}")]
    Body(String),
    /// Anything else the HTTP stack reported
    #[error("transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportFault {
    fn from(error: reqwest::Error) -> Self {
        let msg = error.to_string();
        if error.is_timeout() {
            TransportFault::Timeout(msg)
        } else if error.is_connect() {
            TransportFault::Connect(msg)
        } else if error.is_body() || error.is_decode() {
            TransportFault::Body(msg)
        } else {
            TransportFault::Other(msg)
        }
    }
}

/// Final, already-classified failure of a logical request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 429/5xx or transport faults persisted past the retry budget.
    #[error("{}", exhausted_message(.status, .message, .attempts))]
    ExhaustedRetries {
        status: Option<u16>,
        message: String,
        attempts: u32,
        #[source]
        source: Option<TransportFault>,
    },

    /// Any other non-2xx status; never retried.
    #[error("API error ({status}): {message}")]
    NonRetryable { status: u16, message: String },

    /// The caller's cancellation token fired before the request finished.
    #[error("request cancelled")]
    Cancelled,

    /// The client could not be built from the given configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

fn exhausted_message(status: &Option<u16>, message: &str, attempts: &u32) -> String {
    match status {
        Some(code) => format!(
            "API error ({}) after {} attempts: {}",
            code, attempts, message
        ),
        None => format!("request failed after {} attempts: {}", attempts, message),
    }
}

impl ApiError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ExhaustedRetries { status, .. } => *status,
            ApiError::NonRetryable { status, .. } => Some(*status),
            ApiError::Cancelled | ApiError::Config(_) => None,
        }
    }

    /// Server- or transport-supplied message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            ApiError::ExhaustedRetries { message, .. } | ApiError::NonRetryable { message, .. } => {
                Some(message)
            }
            ApiError::Cancelled | ApiError::Config(_) => None,
        }
    }
}
