//! Agent-facing tools
//!
//! # Public Library Contract
//!
//! The [`Tool`] trait is the contract every tool implements; hosts (the MCP
//! server, the HTTP façade) only ever talk to tools through it or through a
//! [`Toolkit`].
//!
//! # Architecture
//!
//! - [`Tool`] trait: introspection plus a JSON-in, text-out `call`
//! - [`CurlTool`] (`execute_curl`): parse a curl command, then execute it
//! - [`HttpRequestTool`] (`http_request`): execute a structured request
//! - [`Toolkit`]: tools registered by name
//!
//! A call never faults. Invalid input and parser errors come back as an
//! output flagged `is_error`; HTTP failures come back as a normal output
//! whose [`ResponseDescriptor`] has `success = false`.
//!
//! # Example
//!
//! ```
//! use curlkit::{HttpExecutor, Toolkit};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let toolkit = Toolkit::new(Arc::new(HttpExecutor::new().unwrap()));
//! assert!(toolkit.get("execute_curl").is_some());
//!
//! let output = toolkit
//!     .call("execute_curl", serde_json::json!({"curlCommand": "wget https://example.com"}))
//!     .await;
//! assert!(output.is_error);
//! assert!(output.text.contains("must start with 'curl'"));
//! # });
//! ```

mod curl;
mod http_request;
mod validate;

pub use curl::{CurlTool, ExecuteCurlInput};
pub use http_request::{AuthInput, AuthType, HttpRequestInput, HttpRequestTool};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::descriptor::ResponseDescriptor;
use crate::error::{Error, ValidationIssue};
use crate::network::HttpExecutor;

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the curl command tool
pub const EXECUTE_CURL: &str = "execute_curl";

/// Name of the structured request tool
pub const HTTP_REQUEST: &str = "http_request";

/// Tool contract
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool identifier (e.g., "execute_curl")
    fn name(&self) -> &str;

    /// One-line description for tool listings
    fn short_description(&self) -> &str;

    /// Full description
    fn description(&self) -> String;

    /// Full documentation for LLMs (human readable, with examples)
    fn help(&self) -> String;

    /// Condensed description for system prompts (token-efficient)
    fn system_prompt(&self) -> String;

    /// JSON Schema for input validation
    fn input_schema(&self) -> Value;

    /// JSON Schema for output structure
    fn output_schema(&self) -> Value;

    /// Library/tool version
    fn version(&self) -> &str;

    /// Run the tool on raw JSON arguments
    async fn call(&self, input: Value) -> ToolOutput;
}

/// Text result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Pretty JSON: a [`ResponseDescriptor`] or an [`ErrorPayload`]
    pub text: String,
    /// True only for tool-level errors, never for failed HTTP requests
    pub is_error: bool,
}

impl ToolOutput {
    /// Successful call carrying the response descriptor.
    pub fn response(response: &ResponseDescriptor) -> Self {
        Self {
            text: to_pretty_json(response),
            is_error: false,
        }
    }

    /// Tool-level error.
    pub fn error(error: &Error) -> Self {
        Self::from_payload(ErrorPayload::from(error))
    }

    /// Tool-level error with a plain message and no details.
    pub fn error_message(message: impl Into<String>) -> Self {
        Self::from_payload(ErrorPayload::new(message))
    }

    fn from_payload(payload: ErrorPayload) -> Self {
        Self {
            text: to_pretty_json(&payload),
            is_error: true,
        }
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"success":false,"error":"serialization failed: {e}"}}"#))
}

/// Body of every tool-level error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    /// Always false
    pub success: bool,
    pub error: String,
    /// Per-field problems, for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationIssue>>,
}

impl ErrorPayload {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
        }
    }
}

impl From<&Error> for ErrorPayload {
    fn from(error: &Error) -> Self {
        let details = match error {
            Error::Validation(issues) => Some(issues.clone()),
            _ => None,
        };
        Self {
            success: false,
            error: error.to_string(),
            details,
        }
    }
}

/// Tools addressed by name.
#[derive(Clone, Default)]
pub struct Toolkit {
    tools: Vec<Arc<dyn Tool>>,
}

impl Toolkit {
    /// Toolkit with `execute_curl` and `http_request` sharing one executor.
    pub fn new(executor: Arc<HttpExecutor>) -> Self {
        Self::empty()
            .register(CurlTool::new(Arc::clone(&executor)))
            .register(HttpRequestTool::new(executor))
    }

    /// Toolkit with no tools registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name replaces the earlier one.
    pub fn register(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(Arc::new(tool));
        self
    }

    /// Registered tools, in registration order.
    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Call a tool by name. Unknown names produce an error output.
    pub async fn call(&self, name: &str, input: Value) -> ToolOutput {
        match self.get(name) {
            Some(tool) => tool.call(input).await,
            None => {
                tracing::warn!(tool = %name, "unknown tool");
                ToolOutput::error_message(format!("Unknown tool: {name}"))
            }
        }
    }
}

impl std::fmt::Debug for Toolkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolkit")
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
