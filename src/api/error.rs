//! Error types for the control-plane REST clients.

use thiserror::Error;

use crate::resource::ResourceKind;

/// Whether a failed call could plausibly succeed if repeated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    /// Transport failures, throttling and server errors.
    Retryable,
    /// Everything else: bad credentials, missing objects, conflicts.
    Fatal,
}

/// Errors raised by API calls.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ApiError {
    /// Raised when the server answers with a non-success status.
    #[error("{method} {path} returned {status}: {body}")]
    Status {
        /// HTTP method of the failed call.
        method: String,
        /// Request path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },
    /// Raised when the request never produced a response.
    #[error("request to {path} failed: {message}")]
    Transport {
        /// Request path.
        path: String,
        /// Transport error message.
        message: String,
    },
    /// Raised when a request cannot be assembled, for example when its body
    /// fails to serialise.
    #[error("failed to build request for {path}: {message}")]
    Request {
        /// Request path.
        path: String,
        /// Builder error message.
        message: String,
    },
    /// Raised when a success response cannot be parsed.
    #[error("failed to decode {path} response: {message}")]
    Decode {
        /// Request path.
        path: String,
        /// Parser error message.
        message: String,
    },
    /// Raised when a client is built from an unusable host.
    #[error("invalid host {host}: {message}")]
    InvalidHost {
        /// Host as configured.
        host: String,
        /// Parser error message.
        message: String,
    },
    /// Raised when a collection cannot perform an operation.
    #[error("{operation} is not supported for {kind}")]
    Unsupported {
        /// Operation that was attempted.
        operation: &'static str,
        /// Kind the operation was attempted on.
        kind: ResourceKind,
    },
}

impl ApiError {
    /// Classifies the failure.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Transport { .. } => Severity::Retryable,
            Self::Status { status, .. } if *status == 429 || *status >= 500 => {
                Severity::Retryable
            }
            _ => Severity::Fatal,
        }
    }

    /// Returns `true` when the server reported an authentication failure.
    #[must_use]
    pub const fn is_unauthorised(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}
