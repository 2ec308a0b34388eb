//! `execute_curl` tool

use async_trait::async_trait;
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::validate::{self, Validator};
use super::{EXECUTE_CURL, Tool, ToolOutput, VERSION};
use crate::descriptor::ResponseDescriptor;
use crate::error::Result;
use crate::network::HttpExecutor;
use crate::parser::parse_curl_command;

const HELP: &str = r#"EXECUTE_CURL(1)                  Curlkit Tools                  EXECUTE_CURL(1)

NAME
       execute_curl - parse a curl command and perform the HTTP request

SYNOPSIS
       {"curlCommand": "curl [options] <url>"}

DESCRIPTION
       The command is read by a best-effort pattern matcher, not a shell.
       Variables are not expanded, line continuations and pipelines are not
       understood, and unrecognized flags are ignored. The command must start
       with `curl` and contain an http:// or https:// URL.

OPTIONS
       -X, --request METHOD
              GET, POST, PUT, PATCH, DELETE, HEAD or OPTIONS. Defaults to
              POST when a body is given, GET otherwise.

       -H, --header 'Name: Value'
              Request header. The argument must be quoted. An
              `Authorization: Bearer <token>` header also sets bearer auth.

       -d, --data, --data-raw, --data-ascii, --data-binary, --data-urlencode
              Request body, taken verbatim. Only the first occurrence is
              used. Sent with Content-Type: application/json unless a
              Content-Type header is given.

       -u, --user user[:password]
              Basic auth. Takes precedence over a bearer Authorization header.

       -k, --insecure
              Accepted but has no effect: certificates are always verified.

       Requests time out after 30 seconds and follow up to 5 redirects.

OUTPUT
       JSON object: success, status, statusText, headers, body, bodySize,
       durationMs and, when success is false, error. A status of 0 means no
       response was received.

EXAMPLES
       Simple GET:
           {"curlCommand": "curl https://api.example.com/users"}

       JSON POST:
           {"curlCommand": "curl -X POST https://api.example.com/users -H 'Content-Type: application/json' -d '{\"name\":\"ada\"}'"}

       Basic auth:
           {"curlCommand": "curl -u alice:secret https://api.example.com/me"}

SEE ALSO
       http_request, curl(1)
"#;

/// Input of the `execute_curl` tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteCurlInput {
    /// Complete curl command, starting with `curl`
    pub curl_command: String,
}

impl ExecuteCurlInput {
    /// Validate raw JSON arguments.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Validation`] listing every failed field.
    pub fn from_value(input: &Value) -> Result<Self> {
        let mut v = Validator::new();
        if let Some(obj) = v.object(input) {
            v.required_string(obj, "curlCommand");
        }
        v.finish()?;
        validate::deserialize(input)
    }
}

/// Parses curl commands and executes them.
#[derive(Debug, Clone)]
pub struct CurlTool {
    executor: Arc<HttpExecutor>,
}

impl CurlTool {
    pub fn new(executor: Arc<HttpExecutor>) -> Self {
        Self { executor }
    }

    /// Parse and execute one command.
    ///
    /// # Errors
    ///
    /// Parser errors only; HTTP failures are reported in the response.
    pub async fn run(&self, input: &ExecuteCurlInput) -> Result<ResponseDescriptor> {
        let descriptor = parse_curl_command(&input.curl_command)?;
        Ok(self.executor.execute(&descriptor).await)
    }

    async fn run_value(&self, input: &Value) -> Result<ResponseDescriptor> {
        let input = ExecuteCurlInput::from_value(input)?;
        self.run(&input).await
    }
}

#[async_trait]
impl Tool for CurlTool {
    fn name(&self) -> &str {
        EXECUTE_CURL
    }

    fn short_description(&self) -> &str {
        "Execute a curl command and return the HTTP response"
    }

    fn description(&self) -> String {
        "Parses a curl command (-X, -H, -d, -u) and performs the request. \
         Returns status, headers, body and timing as JSON. HTTP errors are \
         reported with success=false rather than failing the call."
            .to_string()
    }

    fn help(&self) -> String {
        HELP.to_string()
    }

    fn system_prompt(&self) -> String {
        format!(
            "{EXECUTE_CURL}: run `curl` commands. Input {{\"curlCommand\": \"curl ...\"}}. \
             Supports -X, -H (quoted), -d/--data*, -u. -k is ignored."
        )
    }

    fn input_schema(&self) -> Value {
        let schema = schema_for!(ExecuteCurlInput);
        serde_json::to_value(schema).unwrap_or_default()
    }

    fn output_schema(&self) -> Value {
        let schema = schema_for!(ResponseDescriptor);
        serde_json::to_value(schema).unwrap_or_default()
    }

    fn version(&self) -> &str {
        VERSION
    }

    async fn call(&self, input: Value) -> ToolOutput {
        match self.run_value(&input).await {
            Ok(response) => ToolOutput::response(&response),
            Err(err) => {
                tracing::debug!(tool = EXECUTE_CURL, kind = err.kind(), "tool call rejected");
                ToolOutput::error(&err)
            }
        }
    }
}
