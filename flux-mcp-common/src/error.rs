//! Error types for the common library.
//!
//! This module provides a unified error hierarchy using `thiserror` for consistent
//! error handling across the Flux MCP server.
//!
//! # Error Categories
//!
//! - `Error::Validation`: Bad caller input, never reaches the network
//! - `Error::Authentication`: Missing or rejected API key
//! - `Error::Rejected`: Service-side input rejection (content policy, malformed input)
//! - `Error::Transport`: Connection failure while talking to the service
//! - `Error::ServiceFailure`: A job reached a terminal failure state
//! - `Error::Timeout`: The polling ceiling was exceeded
//! - `Error::Cancelled`: The caller aborted the request
//! - `Error::Api`, `Error::Config`, `Error::Io`, `Error::Internal`: Uncategorized failures
//!
//! Every variant maps onto a stable [`ErrorKind`] so the tool layer can report
//! a machine-readable category alongside the message.

use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Unified error type for the common library.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors (invalid environment values)
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or invalid credential
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The service refused the request (HTTP 4xx other than auth)
    #[error("Request rejected (HTTP {status_code}): {message}")]
    Rejected {
        /// HTTP status code returned by the service
        status_code: u16,
        /// Response body or service-provided reason
        message: String,
    },

    /// Connection-level failure; the request never reached the service
    #[error("Transport error: {0}")]
    Transport(String),

    /// The generation job failed on the service side
    #[error("Generation failed: {0}")]
    ServiceFailure(String),

    /// Polling gave up waiting for a terminal state
    #[error("Generation timed out after {seconds} seconds ({attempts} status checks)")]
    Timeout {
        /// Configured polling ceiling in seconds
        seconds: u64,
        /// Status queries issued before giving up
        attempts: u32,
    },

    /// The caller cancelled the request
    #[error("Generation cancelled by caller after {attempts} status checks")]
    Cancelled {
        /// Status queries issued before cancellation was observed
        attempts: u32,
    },

    /// API errors with endpoint and HTTP status context
    ///
    /// Used for responses the adapter does not know how to classify, such as
    /// unexpected status codes or bodies that fail to parse.
    #[error("API error for {endpoint} (HTTP {status_code}): {message}")]
    Api {
        /// The API endpoint that was called
        endpoint: String,
        /// HTTP status code returned by the API (0 when no response was received)
        status_code: u16,
        /// Error message from the API or describing the failure
        message: String,
    },

    /// File system I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Unexpected internal failure, e.g. a panicked generation task
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new API error with endpoint, status code, and message.
    ///
    /// # Example
    ///
    /// ```
    /// use flux_mcp_common::error::Error;
    ///
    /// let err = Error::api("https://api.bfl.ai/v1/flux-pro-1.1", 500, "Internal server error");
    /// assert!(err.to_string().contains("api.bfl.ai"));
    /// assert!(err.to_string().contains("500"));
    /// ```
    pub fn api(endpoint: impl Into<String>, status_code: u16, message: impl Into<String>) -> Self {
        Error::Api {
            endpoint: endpoint.into(),
            status_code,
            message: message.into(),
        }
    }

    /// Create a new validation error.
    ///
    /// # Example
    ///
    /// ```
    /// use flux_mcp_common::error::Error;
    ///
    /// let err = Error::validation("prompt cannot be empty");
    /// assert!(err.to_string().contains("prompt cannot be empty"));
    /// ```
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Create a new authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Error::Authentication(message.into())
    }

    /// Create a new rejection error from a service status code and body.
    pub fn rejected(status_code: u16, message: impl Into<String>) -> Self {
        Error::Rejected {
            status_code,
            message: message.into(),
        }
    }

    /// Create a new transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Error::Transport(message.into())
    }

    /// Create a new service failure error.
    pub fn service_failure(reason: impl Into<String>) -> Self {
        Error::ServiceFailure(reason.into())
    }

    /// Create a new timeout error.
    ///
    /// # Example
    ///
    /// ```
    /// use flux_mcp_common::error::Error;
    ///
    /// let err = Error::timeout(120, 42);
    /// assert!(err.to_string().contains("120 seconds"));
    /// ```
    pub fn timeout(seconds: u64, attempts: u32) -> Self {
        Error::Timeout { seconds, attempts }
    }

    /// Create a new cancellation error.
    pub fn cancelled(attempts: u32) -> Self {
        Error::Cancelled { attempts }
    }

    /// Create a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }

    /// Stable category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Authentication(_) => ErrorKind::Authentication,
            Error::Rejected { .. } => ErrorKind::Rejected,
            Error::Transport(_) => ErrorKind::Transport,
            Error::ServiceFailure(_) => ErrorKind::ServiceFailure,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Cancelled { .. } => ErrorKind::Cancelled,
            Error::Api { .. } | Error::Config(_) | Error::Io(_) | Error::Internal(_) => {
                ErrorKind::Unknown
            }
        }
    }

    /// Stable type label reported to tool callers as `error_type`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Error::Validation(_) => "ValidationError",
            Error::Authentication(_) => "AuthenticationError",
            Error::Rejected { .. } => "RequestRejectedError",
            Error::Transport(_) => "TransportError",
            Error::ServiceFailure(_) => "ServiceFailureError",
            Error::Timeout { .. } => "TimeoutError",
            Error::Cancelled { .. } => "CancelledError",
            Error::Api { .. } => "ApiError",
            Error::Config(_) => "ConfigError",
            Error::Io(_) => "IoError",
            Error::Internal(_) => "InternalError",
        }
    }

    /// Full diagnostic rendering: the source chain followed by the debug form.
    ///
    /// This is what unknown-kind results carry, since the tool caller has no
    /// other view of the server's logs.
    pub fn diagnostics(&self) -> String {
        let mut out = format!("{}: {}", self.type_name(), self);
        let mut source = StdError::source(self);
        while let Some(cause) = source {
            out.push_str(&format!("\n  caused by: {}", cause));
            source = cause.source();
        }
        out.push_str(&format!("\n\n{:#?}", self));
        out
    }
}

/// Stable error categories exposed to tool callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Authentication,
    Rejected,
    Transport,
    ServiceFailure,
    Timeout,
    Cancelled,
    Unknown,
}

impl ErrorKind {
    /// The snake_case name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Rejected => "rejected",
            ErrorKind::Transport => "transport",
            ErrorKind::ServiceFailure => "service_failure",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration errors.
///
/// These errors occur when loading or validating configuration from
/// environment variables or `.env` files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl ConfigError {
    /// Create a new invalid value error.
    pub fn invalid_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue(name.into(), reason.into())
    }
}

/// Result type alias using the unified Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_includes_endpoint_and_status() {
        let err = Error::api("https://api.bfl.ai/v1/get_result", 502, "Bad gateway");
        let msg = err.to_string();
        assert!(msg.contains("api.bfl.ai"), "Should contain endpoint");
        assert!(msg.contains("502"), "Should contain status code");
        assert!(msg.contains("Bad gateway"), "Should contain message");
    }

    #[test]
    fn test_config_error_includes_var_name() {
        let err = ConfigError::invalid_value("FLUX_POLL_TIMEOUT_SECS", "not a number");
        assert!(err.to_string().contains("FLUX_POLL_TIMEOUT_SECS"));
        assert!(err.to_string().contains("not a number"));
    }

    #[test]
    fn test_error_from_config_error() {
        let err: Error = ConfigError::invalid_value("FLUX_REQUEST_TIMEOUT_SECS", "not a number").into();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(err.type_name(), "ConfigError");
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_timeout_error() {
        let err = Error::timeout(120, 17);
        let msg = err.to_string();
        assert!(msg.contains("120"), "Should contain timeout duration");
        assert!(msg.contains("17"), "Should contain attempts");
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn test_service_failure_keeps_reason_verbatim() {
        let err = Error::service_failure("policy violation");
        assert!(err.to_string().contains("policy violation"));
        assert_eq!(err.kind(), ErrorKind::ServiceFailure);
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(ErrorKind::ServiceFailure.to_string(), "service_failure");
        assert_eq!(
            serde_json::to_value(ErrorKind::Rejected).unwrap(),
            serde_json::json!("rejected")
        );
    }
}
