//! Network layer for Curlkit
//!
//! Executes request descriptors and normalizes whatever comes back.
//!
//! # Failure model
//!
//! Nothing in this module returns an error to the caller of
//! [`HttpExecutor::execute`]. Three failure shapes are distinguished in the
//! returned descriptor:
//!
//! - a non-2xx response was received (`status` is the real status)
//! - the request was sent but no response arrived (`status == 0`,
//!   `"No Response"` / `"Unknown Error"`)
//! - the request could not be dispatched (`status == 0`, `"Request Error"`)

mod client;
mod outgoing;
mod response;

pub use client::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MAX_REDIRECTS, DEFAULT_USER_AGENT, HttpExecutor,
    HttpExecutorBuilder,
};
pub use outgoing::{
    AUTHORIZATION, BasicCredentials, CONTENT_TYPE, DEFAULT_CONTENT_TYPE, ExecutorPolicy,
    OutgoingRequest,
};
pub use response::{
    NO_RESPONSE, REQUEST_ERROR, TransportFailure, TransportFailureKind, UNKNOWN_ERROR,
    render_body,
};
