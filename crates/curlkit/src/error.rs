//! Error types for Curlkit
//!
//! Only the parser and the tool input validation raise errors. Transport
//! failures never surface here: the executor captures them into a
//! [`ResponseDescriptor`](crate::ResponseDescriptor).
//!
//! Messages are meant to be shown to the calling agent as-is.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using Curlkit's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Curlkit error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Input does not start with the `curl` token.
    #[error("Invalid curl command: must start with 'curl'")]
    InvalidCommand,

    /// No http/https URL was found in the command.
    #[error("No valid URL found in curl command")]
    MissingUrl,

    /// Structured tool input failed its shape/type constraints.
    #[error("Invalid input")]
    Validation(Vec<ValidationIssue>),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// Internal error for unexpected failures, such as a panic while the
    /// HTTP façade handles a request.
    ///
    /// Carries a human-readable message only; never a panic payload or
    /// internal path.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error with a single issue.
    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![ValidationIssue::new(path, message)])
    }

    /// Short machine-friendly category, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidCommand => "invalid_command",
            Error::MissingUrl => "missing_url",
            Error::Validation(_) => "validation_error",
            Error::Client(_) => "client_error",
            Error::Internal(_) => "internal_error",
        }
    }
}

/// One failed constraint on a tool input.
///
/// `path` is a dotted path into the input object (`"headers.Accept"`),
/// empty when the input itself has the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}
