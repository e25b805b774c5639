//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the workspace.
//!
//! Three failure families exist:
//! - [`Error`]: missing or invalid configuration (fatal only at service start)
//!   and service lifecycle misuse
//! - [`ResolutionError`]: the public IP could not be fetched for one address family
//! - [`RemoteUpdateError`]: the provider rejected or never received an update

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Service lifecycle errors (e.g. starting twice)
    #[error("Service error: {0}")]
    Service(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a service lifecycle error
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    /// Whether this error should abort service start
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Failure to learn the current public address from an endpoint
///
/// Every variant carries the endpoint so log lines identify which
/// address family failed. None of these are retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// Connection refused, DNS failure, timeout or other transport problem
    #[error("request to {endpoint} failed: {message}")]
    Network { endpoint: String, message: String },

    /// The endpoint answered with a non-2xx status
    #[error("{endpoint} answered with HTTP status {status}")]
    Status { endpoint: String, status: u16 },

    /// Body could not be read or was not the expected JSON object
    #[error("malformed response from {endpoint}: {message}")]
    MalformedBody { endpoint: String, message: String },

    /// The `ip` field was present but empty
    #[error("no IP address found in response from {endpoint}")]
    EmptyAddress { endpoint: String },
}

impl ResolutionError {
    /// The endpoint that produced this failure
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Network { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::MalformedBody { endpoint, .. }
            | Self::EmptyAddress { endpoint } => endpoint,
        }
    }
}

/// Failure of a single remote record update
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteUpdateError {
    /// Structured error returned by the provider API
    #[error("provider error: Code={code}, Message={message}, RequestId={request_id}")]
    Provider {
        code: String,
        message: String,
        request_id: String,
    },

    /// The request never produced a response (connect failure, timeout, TLS)
    #[error("transport error: {0}")]
    Transport(String),

    /// A response arrived but could not be understood
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}
