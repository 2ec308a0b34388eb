//! Request and response descriptors
//!
//! Both are plain values created fresh per call. A [`RequestDescriptor`]
//! describes what to send; a [`ResponseDescriptor`] describes what came
//! back (or why nothing did). Neither is mutated once handed to the
//! executor.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Default per-request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub(crate) fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

pub(crate) fn default_follow_redirects() -> bool {
    true
}

/// HTTP request method
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    /// Every supported method, in declaration order.
    pub const ALL: [Method; 7] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Head,
        Method::Options,
    ];

    /// Canonical uppercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    /// Look up a method by its exact uppercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }

    /// Whether the executor attaches a request body for this method.
    pub fn allows_body(self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }

    pub(crate) fn as_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request authentication. Absence of a value means no auth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Auth {
    /// Username/password sent as transport-level basic credentials.
    Basic { username: String, password: String },
    /// Token sent as `Authorization: Bearer <token>`.
    Bearer { token: String },
}

impl Auth {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Auth::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Auth::Bearer {
            token: token.into(),
        }
    }

    /// Variant name, safe to log.
    pub fn kind(&self) -> &'static str {
        match self {
            Auth::Basic { .. } => "basic",
            Auth::Bearer { .. } => "bearer",
        }
    }
}

/// A fully specified HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescriptor {
    /// Absolute http/https URL
    pub url: String,
    #[serde(default)]
    pub method: Method,
    /// Header names are kept exactly as supplied
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Auth>,
    /// Per-request timeout; 0 disables it
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_follow_redirects")]
    pub follow_redirects: bool,
}

impl RequestDescriptor {
    /// Create a GET descriptor with default timeout and redirect policy.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            headers: BTreeMap::new(),
            body: None,
            auth: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            follow_redirects: true,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }
}

/// Normalized outcome of one request.
///
/// The same shape is used for success and every failure mode:
/// `success` is true iff a 2xx status was reached, `status` is 0 when no
/// response arrived, and `error` is present iff `success` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDescriptor {
    pub success: bool,
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    /// Response body rendered as text; JSON objects/arrays are pretty-printed
    pub body: String,
    /// UTF-8 byte length of `body`
    pub body_size: usize,
    /// Wall-clock time from dispatch to completion or failure
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_method_names() {
        for method in Method::ALL {
            assert_eq!(Method::from_name(method.as_str()), Some(method));
            assert_eq!(method.to_string(), method.as_str());
        }
        assert_eq!(Method::from_name("get"), None);
        assert_eq!(Method::from_name("TRACE"), None);
    }

    #[test]
    fn test_method_allows_body() {
        assert!(Method::Post.allows_body());
        assert!(Method::Put.allows_body());
        assert!(Method::Patch.allows_body());
        assert!(!Method::Get.allows_body());
        assert!(!Method::Delete.allows_body());
        assert!(!Method::Head.allows_body());
        assert!(!Method::Options.allows_body());
    }

    #[test]
    fn test_request_defaults() {
        let req = RequestDescriptor::new("https://example.com");
        assert_eq!(req.method, Method::Get);
        assert!(req.headers.is_empty());
        assert_eq!(req.body, None);
        assert_eq!(req.auth, None);
        assert_eq!(req.timeout_ms, 30_000);
        assert!(req.follow_redirects);
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let req = RequestDescriptor::new("https://example.com")
            .with_method(Method::Post)
            .with_body("{}")
            .with_auth(Auth::basic("alice", "secret"));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["method"], "POST");
        assert_eq!(json["timeoutMs"], 30_000);
        assert_eq!(json["followRedirects"], true);
        assert_eq!(json["auth"]["type"], "basic");
        assert_eq!(json["auth"]["username"], "alice");
    }

    #[test]
    fn test_request_omits_absent_body_and_auth() {
        let json = serde_json::to_value(RequestDescriptor::new("https://example.com")).unwrap();
        assert!(json.get("body").is_none());
        assert!(json.get("auth").is_none());
    }

    #[test]
    fn test_request_deserialize_applies_defaults() {
        let req: RequestDescriptor =
            serde_json::from_str(r#"{"url":"https://example.com"}"#).unwrap();
        assert_eq!(req, RequestDescriptor::new("https://example.com"));
    }

    #[test]
    fn test_bearer_auth_json_shape() {
        let json = serde_json::to_value(Auth::bearer("abc123")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "bearer", "token": "abc123"}));
    }
}
