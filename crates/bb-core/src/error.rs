//! # ClientError
//!
//! Centralized error handling for the boba-client crates.
//! Every failure at a port boundary is mapped to one of these variants.

use thiserror::Error;

/// The primary error type for all bb-core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Resource not found (e.g., Board, Thread, Post)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// A server payload failed validation at the mapper boundary
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// An operation that needs a logged in user was attempted without one
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The request never got a response (connection refused, timeout, ...)
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("server responded with status {status}: {message}")]
    Http { status: u16, message: String },

    /// The local snapshot could not be read or written
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// Anything else (e.g., a background task panicked)
    #[error("internal client error: {0}")]
    Internal(String),
}

/// A specialized Result type for boba-client logic.
pub type Result<T> = std::result::Result<T, ClientError>;
