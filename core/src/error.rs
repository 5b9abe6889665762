//! Error type shared by the request builder and the response wrapper.
//!
//! # Design
//! A request travels through a single pipeline (configure, encode, send,
//! decode) and the first failure anywhere in it is terminal. Every stage
//! therefore reports into the same `Error` enum so callers can match on the
//! stage that failed without juggling per-stage error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by request interceptors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while building, sending or decoding a request.
#[derive(Debug, Error)]
pub enum Error {
    /// The method token is not a valid HTTP method.
    #[error("invalid HTTP method: {0:?}")]
    InvalidMethod(String),

    /// A header name or value could not be represented on the wire.
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The request could not be assembled, usually a malformed URL.
    #[error("invalid request: {0}")]
    Request(#[from] ureq::http::Error),

    /// JSON encoding of the request body or decoding of the response body.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A multipart attachment could not be read.
    #[error("failed to attach {path}: {source}")]
    Attachment {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The multipart framing could not be written.
    #[error("failed to encode multipart body: {0}")]
    Multipart(#[source] io::Error),

    /// An interceptor rejected the outgoing request.
    #[error("request rejected by interceptor: {0}")]
    Interceptor(BoxError),

    /// The transport failed to execute the request (DNS, connect, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),

    /// Reading the response body failed.
    #[error("failed to read response body: {0}")]
    Read(#[source] io::Error),

    /// The response body is not valid UTF-8.
    #[error("response body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// An explicit status check failed.
    #[error("unexpected status {status}, expected {expected}")]
    Status { status: u16, expected: &'static str },

    /// Writing the response body to disk failed.
    #[error("failed to save response to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Status code carried by a failed status check, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
