//! Curlkit - curl commands and HTTP requests as agent tools
//!
//! Part of the Everruns ecosystem.
//!
//! Two entry points produce a [`RequestDescriptor`]: [`parse_curl_command`]
//! for curl-style command strings, and [`HttpRequestInput`] for structured
//! JSON. [`HttpExecutor`] turns a descriptor into a [`ResponseDescriptor`],
//! the same shape for every outcome.
//!
//! # Example
//!
//! ```rust
//! use curlkit::{Auth, Method, parse_curl_command};
//!
//! let req = parse_curl_command("curl -u alice:secret -d 'x=1' https://example.com/login")?;
//! assert_eq!(req.method, Method::Post);
//! assert_eq!(req.body.as_deref(), Some("x=1"));
//! assert_eq!(req.auth, Some(Auth::basic("alice", "secret")));
//! # Ok::<(), curlkit::Error>(())
//! ```
//!
//! Executing it:
//!
//! ```rust,no_run
//! use curlkit::{HttpExecutor, RequestDescriptor};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let executor = HttpExecutor::new()?;
//!     let resp = executor.execute(&RequestDescriptor::new("https://example.com")).await;
//!     println!("{} {} ({} bytes)", resp.status, resp.status_text, resp.body_size);
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `server` (default): [`api`] module, an axum router exposing the tools
//!   as plain HTTP endpoints

mod descriptor;
mod error;
mod logging_impl;
mod network;
mod parser;
mod tool;

#[cfg(feature = "server")]
pub mod api;

pub use descriptor::{Auth, DEFAULT_TIMEOUT_MS, Method, RequestDescriptor, ResponseDescriptor};
pub use error::{Error, Result, ValidationIssue};
pub use logging_impl::{LogConfig, format_body_for_log, format_headers_for_log, sanitize_for_log};
pub use network::{
    AUTHORIZATION, BasicCredentials, CONTENT_TYPE, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_CONTENT_TYPE, DEFAULT_MAX_REDIRECTS, DEFAULT_USER_AGENT, ExecutorPolicy, HttpExecutor,
    HttpExecutorBuilder, NO_RESPONSE, OutgoingRequest, REQUEST_ERROR, TransportFailure,
    TransportFailureKind, UNKNOWN_ERROR, render_body,
};
pub use parser::parse_curl_command;
pub use tool::{
    AuthInput, AuthType, CurlTool, EXECUTE_CURL, ErrorPayload, ExecuteCurlInput, HTTP_REQUEST,
    HttpRequestInput, HttpRequestTool, Tool, ToolOutput, Toolkit, VERSION,
};
