use std::time::Duration;

use thiserror::Error;

use crate::Operation;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout {
        operation: Operation,
        after: Duration,
    },
    #[error("service error {code}: {message}")]
    Remote { code: i64, message: String },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("transport failed: {0}")]
    Transport(String),
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}

/// Receives every transport or remote error before it is returned.
pub trait ErrorSink: Send + Sync {
    fn report(&self, operation: Operation, error: &ClientError);
}

/// Logs errors through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, operation: Operation, error: &ClientError) {
        tracing::warn!(operation = %operation, error = %error, "remote call failed");
    }
}
