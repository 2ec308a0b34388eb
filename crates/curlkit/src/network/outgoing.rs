//! Outgoing request preparation
//!
//! An [`OutgoingRequest`] is derived from a [`RequestDescriptor`] by pure
//! transforms; the descriptor is only ever borrowed.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::descriptor::{Auth, Method, RequestDescriptor};

/// Header key checked (case-sensitively) before defaulting the content type.
pub const CONTENT_TYPE: &str = "Content-Type";

/// Content type assumed for bodies sent without one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Header key used for bearer injection.
pub const AUTHORIZATION: &str = "Authorization";

/// Toggles for the two request-shaping policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorPolicy {
    /// Add `Content-Type: application/json` to bodies sent without one
    pub default_content_type: bool,
    /// Apply the descriptor's auth (basic credentials / bearer header)
    pub inject_auth: bool,
}

impl Default for ExecutorPolicy {
    fn default() -> Self {
        Self {
            default_content_type: true,
            inject_auth: true,
        }
    }
}

/// Username/password handed to the transport.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// The request as it will be handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    /// Present only for methods that carry a body
    pub body: Option<String>,
    pub credentials: Option<BasicCredentials>,
    /// `None` when the descriptor's timeout is 0
    pub timeout: Option<Duration>,
    pub follow_redirects: bool,
}

impl OutgoingRequest {
    /// Copy a descriptor into an outgoing request, dropping the body for
    /// methods other than POST/PUT/PATCH. No policy is applied.
    pub fn from_descriptor(descriptor: &RequestDescriptor) -> Self {
        let body = if descriptor.method.allows_body() {
            descriptor.body.clone()
        } else {
            None
        };
        let timeout =
            (descriptor.timeout_ms > 0).then(|| Duration::from_millis(descriptor.timeout_ms));

        Self {
            method: descriptor.method,
            url: descriptor.url.clone(),
            headers: descriptor.headers.clone(),
            body,
            credentials: None,
            timeout,
            follow_redirects: descriptor.follow_redirects,
        }
    }

    /// Apply the enabled policies in order: content type, then auth.
    pub fn prepare(descriptor: &RequestDescriptor, policy: ExecutorPolicy) -> Self {
        let mut outgoing = Self::from_descriptor(descriptor);
        if policy.default_content_type {
            outgoing = outgoing.with_default_content_type();
        }
        if policy.inject_auth {
            outgoing = outgoing.with_auth(descriptor.auth.as_ref());
        }
        outgoing
    }

    /// Set `Content-Type: application/json` when a body is attached and no
    /// header is keyed exactly `Content-Type`.
    pub fn with_default_content_type(mut self) -> Self {
        if self.body.is_some() && !self.headers.contains_key(CONTENT_TYPE) {
            self.headers
                .insert(CONTENT_TYPE.to_string(), DEFAULT_CONTENT_TYPE.to_string());
        }
        self
    }

    /// Apply auth.
    ///
    /// Bearer replaces any `Authorization` header, whatever its case, with
    /// `Authorization: Bearer <token>`. Basic becomes transport credentials
    /// and drops every `Authorization` header the same way.
    pub fn with_auth(mut self, auth: Option<&Auth>) -> Self {
        match auth {
            Some(Auth::Bearer { token }) => {
                self.drop_authorization();
                self.headers
                    .insert(AUTHORIZATION.to_string(), format!("Bearer {token}"));
            }
            Some(Auth::Basic { username, password }) => {
                self.drop_authorization();
                self.credentials = Some(BasicCredentials {
                    username: username.clone(),
                    password: password.clone(),
                });
            }
            None => {}
        }
        self
    }

    fn drop_authorization(&mut self) {
        self.headers
            .retain(|name, _| !name.eq_ignore_ascii_case(AUTHORIZATION));
    }
}
