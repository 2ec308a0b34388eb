//! `http_request` tool

use async_trait::async_trait;
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::validate::{self, Validator};
use super::{HTTP_REQUEST, Tool, ToolOutput, VERSION};
use crate::descriptor::{
    Auth, Method, RequestDescriptor, ResponseDescriptor, default_follow_redirects,
    default_timeout_ms,
};
use crate::error::Result;
use crate::network::HttpExecutor;

const HELP: &str = r#"HTTP_REQUEST(1)                  Curlkit Tools                  HTTP_REQUEST(1)

NAME
       http_request - perform an HTTP request described as JSON

SYNOPSIS
       {"url": "<absolute url>", "method": "GET", "headers": {}, "body": "...",
        "auth": {...}, "timeout": 30000, "followRedirects": true}

INPUT
       url              Absolute http(s) URL (required)
       method           GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS (default GET)
       headers          Object of header name to string value
       body             Request body; sent only for POST, PUT and PATCH, with
                        Content-Type: application/json unless one is given
       auth             {"type": "basic", "username": "...", "password": "..."}
                        {"type": "bearer", "token": "..."}
                        {"type": "none"}
       timeout          Milliseconds, 0 disables (default 30000)
       followRedirects  Follow up to 5 redirects (default true)

OUTPUT
       JSON object: success, status, statusText, headers, body, bodySize,
       durationMs and, when success is false, error. A status of 0 means no
       response was received.

EXAMPLES
       GET with a header:
           {"url": "https://api.example.com/items", "headers": {"Accept": "application/json"}}

       JSON POST with a token:
           {"url": "https://api.example.com/items", "method": "POST",
            "body": "{\"name\":\"ada\"}", "auth": {"type": "bearer", "token": "abc"}}

SEE ALSO
       execute_curl
"#;

/// Auth variant requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    Basic,
    Bearer,
    None,
}

impl AuthType {
    const NAMES: [&'static str; 3] = ["basic", "bearer", "none"];
}

/// Auth as accepted on the wire; fields irrelevant to `type` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AuthInput {
    #[serde(rename = "type")]
    pub kind: AuthType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl AuthInput {
    /// Basic needs both username and password, bearer needs a token.
    /// Anything incomplete means no auth.
    pub fn resolve(&self) -> Option<Auth> {
        match self.kind {
            AuthType::Basic => match (&self.username, &self.password) {
                (Some(username), Some(password)) => Some(Auth::basic(username, password)),
                _ => None,
            },
            AuthType::Bearer => self.token.as_ref().map(Auth::bearer),
            AuthType::None => None,
        }
    }
}

/// Input of the `http_request` tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequestInput {
    /// Absolute URL to request
    pub url: String,
    #[serde(default)]
    pub method: Method,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthInput>,
    /// Timeout in milliseconds; 0 disables it
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
    #[serde(default = "default_follow_redirects")]
    pub follow_redirects: bool,
}

impl HttpRequestInput {
    /// Validate raw JSON arguments.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Validation`] listing every failed field.
    pub fn from_value(input: &Value) -> Result<Self> {
        let method_names = Method::ALL.map(Method::as_str);

        let mut v = Validator::new();
        if let Some(obj) = v.object(input) {
            if let Some(url) = v.required_string(obj, "url") {
                v.absolute_url("url", url);
            }
            v.optional_enum(obj, "method", &method_names);
            v.optional_string_map(obj, "headers");
            v.optional_string(obj, "body");
            v.optional_object(obj, "auth", |v, auth| {
                if v.required_string(auth, "type").is_some() {
                    v.optional_enum(auth, "type", &AuthType::NAMES);
                }
                v.optional_string(auth, "username");
                v.optional_string(auth, "password");
                v.optional_string(auth, "token");
            });
            v.optional_non_negative_integer(obj, "timeout");
            v.optional_bool(obj, "followRedirects");
        }
        v.finish()?;
        validate::deserialize(input)
    }

    /// Build the request descriptor, applying defaults.
    pub fn into_descriptor(self) -> RequestDescriptor {
        RequestDescriptor {
            url: self.url,
            method: self.method,
            headers: self.headers.unwrap_or_default(),
            body: self.body,
            auth: self.auth.as_ref().and_then(AuthInput::resolve),
            timeout_ms: self.timeout,
            follow_redirects: self.follow_redirects,
        }
    }
}

/// Executes structured requests.
#[derive(Debug, Clone)]
pub struct HttpRequestTool {
    executor: Arc<HttpExecutor>,
}

impl HttpRequestTool {
    pub fn new(executor: Arc<HttpExecutor>) -> Self {
        Self { executor }
    }

    /// Execute one request. Never fails once the input is validated.
    pub async fn run(&self, input: HttpRequestInput) -> ResponseDescriptor {
        self.executor.execute(&input.into_descriptor()).await
    }
}

#[async_trait]
impl Tool for HttpRequestTool {
    fn name(&self) -> &str {
        HTTP_REQUEST
    }

    fn short_description(&self) -> &str {
        "Perform an HTTP request from structured parameters"
    }

    fn description(&self) -> String {
        "Performs an HTTP request described by url, method, headers, body, auth, \
         timeout and followRedirects. Returns status, headers, body and timing \
         as JSON. HTTP errors are reported with success=false rather than \
         failing the call."
            .to_string()
    }

    fn help(&self) -> String {
        HELP.to_string()
    }

    fn system_prompt(&self) -> String {
        format!(
            "{HTTP_REQUEST}: structured HTTP request. Input {{\"url\", \"method\"?, \
             \"headers\"?, \"body\"?, \"auth\"?, \"timeout\"?, \"followRedirects\"?}}."
        )
    }

    fn input_schema(&self) -> Value {
        let schema = schema_for!(HttpRequestInput);
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
        match HttpRequestInput::from_value(&input) {
            Ok(input) => ToolOutput::response(&self.run(input).await),
            Err(err) => {
                tracing::debug!(tool = HTTP_REQUEST, kind = err.kind(), "tool call rejected");
                ToolOutput::error(&err)
            }
        }
    }
}
