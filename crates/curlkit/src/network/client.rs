//! HTTP request executor.
//!
//! [`HttpExecutor`] performs one request per [`RequestDescriptor`] and
//! always returns a [`ResponseDescriptor`]; it never returns an error.
//!
//! - Any status, including 4xx/5xx, is a completed response
//! - Redirects: up to `max_redirects` hops when the descriptor follows them,
//!   none otherwise
//! - Timeout: per request, from the descriptor's `timeout_ms`
//!
//! The executor keeps two pooled clients (one per redirect policy) and no
//! per-call state, so one instance can be shared across concurrent calls.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};
use std::collections::BTreeMap;
use std::sync::Once;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::outgoing::{AUTHORIZATION, CONTENT_TYPE, ExecutorPolicy, OutgoingRequest};
use super::response::{TransportFailure, duration_ms, error_chain, render_body};
use crate::descriptor::{RequestDescriptor, ResponseDescriptor};
use crate::error::{Error, Result};
use crate::logging_impl::{LogConfig, format_body_for_log, format_headers_for_log};

/// Maximum redirect hops followed when a descriptor allows redirects.
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Default connect timeout (10 seconds)
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("curlkit/", env!("CARGO_PKG_VERSION"));

static CRYPTO_PROVIDER: Once = Once::new();

/// Install the ring rustls provider process-wide. reqwest is built with
/// `rustls-no-provider`, so no TLS client can be built before this runs.
fn install_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        // Err means another provider was installed first, which is fine.
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Builder for [`HttpExecutor`].
#[derive(Debug, Clone)]
pub struct HttpExecutorBuilder {
    user_agent: String,
    connect_timeout: Duration,
    max_redirects: usize,
    policy: ExecutorPolicy,
    log_config: LogConfig,
}

impl Default for HttpExecutorBuilder {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            policy: ExecutorPolicy::default(),
            log_config: LogConfig::default(),
        }
    }
}

impl HttpExecutorBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the User-Agent header sent with every request
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the redirect hop limit used when a descriptor follows redirects
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Set the request-shaping policies
    pub fn policy(mut self, policy: ExecutorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the log redaction configuration
    pub fn log_config(mut self, config: LogConfig) -> Self {
        self.log_config = config;
        self
    }

    /// Build the executor.
    ///
    /// # Errors
    ///
    /// [`Error::Client`] if the underlying HTTP client cannot be built.
    pub fn build(self) -> Result<HttpExecutor> {
        install_crypto_provider();

        let follow = self
            .client_builder()
            .redirect(reqwest::redirect::Policy::limited(self.max_redirects))
            .build()
            .map_err(|e| Error::Client(error_chain(&e)))?;
        let direct = self
            .client_builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Client(error_chain(&e)))?;

        Ok(HttpExecutor {
            follow,
            direct,
            policy: self.policy,
            log_config: self.log_config,
        })
    }

    fn client_builder(&self) -> reqwest::ClientBuilder {
        Client::builder()
            .user_agent(self.user_agent.as_str())
            .connect_timeout(self.connect_timeout)
    }
}

/// Executes request descriptors.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    /// Client that follows up to `max_redirects` hops
    follow: Client,
    /// Client that returns the first redirect as-is
    direct: Client,
    policy: ExecutorPolicy,
    log_config: LogConfig,
}

/// A response as read off the wire, before normalization.
struct Received {
    status: u16,
    status_text: String,
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

impl HttpExecutor {
    /// Create an executor with default settings.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a new executor builder
    pub fn builder() -> HttpExecutorBuilder {
        HttpExecutorBuilder::new()
    }

    /// Request-shaping policies in effect.
    pub fn policy(&self) -> ExecutorPolicy {
        self.policy
    }

    /// Perform the request described by `descriptor`.
    ///
    /// Never fails: transport errors, timeouts and non-2xx statuses are all
    /// captured in the returned descriptor.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> ResponseDescriptor {
        let started = Instant::now();
        let outgoing = OutgoingRequest::prepare(descriptor, self.policy);
        let url = self.log_config.redact_url(&outgoing.url).into_owned();

        let headers = format_headers_for_log(&outgoing.headers, &self.log_config);
        let body = outgoing
            .body
            .as_deref()
            .map(|b| format_body_for_log(b, &self.log_config))
            .unwrap_or_default();
        debug!(
            method = %outgoing.method,
            url = %url,
            headers = %headers,
            body = %body,
            basic_auth = outgoing.credentials.is_some(),
            "dispatching request"
        );

        let result = self.dispatch(&outgoing, descriptor.timeout_ms).await;
        let elapsed = started.elapsed();

        match result {
            Ok(received) => {
                let response = ResponseDescriptor::received(
                    received.status,
                    received.status_text,
                    received.headers,
                    render_body(&received.body),
                    elapsed,
                );
                info!(
                    method = %outgoing.method,
                    url = %url,
                    status = response.status,
                    bytes = response.body_size,
                    duration_ms = response.duration_ms,
                    "request completed"
                );
                response
            }
            Err(failure) => {
                warn!(
                    method = %outgoing.method,
                    url = %url,
                    kind = %failure.kind,
                    error = %self.log_config.redact_text(&failure.message),
                    duration_ms = duration_ms(elapsed),
                    "request failed"
                );
                ResponseDescriptor::failed(failure, elapsed)
            }
        }
    }

    async fn dispatch(
        &self,
        outgoing: &OutgoingRequest,
        timeout_ms: u64,
    ) -> std::result::Result<Received, TransportFailure> {
        let url = Url::parse(&outgoing.url)
            .map_err(|e| TransportFailure::dispatch(format!("Invalid URL: {e}")))?;

        let client = if outgoing.follow_redirects {
            &self.follow
        } else {
            &self.direct
        };

        let mut request = client
            .request(outgoing.method.as_reqwest(), url)
            .headers(header_map(&outgoing.headers)?);
        if let Some(credentials) = &outgoing.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }
        if let Some(body) = &outgoing.body {
            request = request.body(body.clone());
        }
        if let Some(timeout) = outgoing.timeout {
            request = request.timeout(timeout);
        }

        // Remaining builder errors surface here, before anything touches the
        // network.
        let request = request
            .build()
            .map_err(|e| TransportFailure::dispatch(error_chain(&e)))?;

        let response = client
            .execute(request)
            .await
            .map_err(|e| TransportFailure::from_reqwest(&e, timeout_ms))?;

        let status = response.status();
        let status_text = reason_phrase(&response);
        let headers = collect_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportFailure::from_reqwest(&e, timeout_ms))?;

        Ok(Received {
            status: status.as_u16(),
            status_text,
            headers,
            body: body.to_vec(),
        })
    }
}

/// Build the wire header map. Each name goes out once: a later header
/// replaces an earlier one that differs only in case, and the exact
/// `Content-Type`/`Authorization` spellings are inserted first so a caller's
/// differently-cased header replaces the defaulted content type.
fn header_map(
    headers: &BTreeMap<String, String>,
) -> std::result::Result<HeaderMap, TransportFailure> {
    let (canonical, rest): (Vec<_>, Vec<_>) = headers
        .iter()
        .partition(|(name, _)| name.as_str() == CONTENT_TYPE || name.as_str() == AUTHORIZATION);

    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in canonical.into_iter().chain(rest) {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            TransportFailure::dispatch(format!("Invalid header name {name:?}: {e}"))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            TransportFailure::dispatch(format!("Invalid value for header {name:?}: {e}"))
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// The reason phrase the server sent, else the canonical one for the status.
fn reason_phrase(response: &reqwest::Response) -> String {
    response
        .extensions()
        .get::<hyper::ext::ReasonPhrase>()
        .map(|reason| String::from_utf8_lossy(reason.as_bytes()).into_owned())
        .or_else(|| response.status().canonical_reason().map(str::to_string))
        .unwrap_or_default()
}

/// Flatten a header map; repeated headers are joined with `", "`.
fn collect_headers(map: &HeaderMap) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in map {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        match headers.get_mut(name.as_str()) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(&value);
            }
            None => {
                headers.insert(name.as_str().to_string(), value);
            }
        }
    }
    headers
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::descriptor::Method;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_collect_headers_joins_repeats() {
        let mut map = HeaderMap::new();
        map.append("set-cookie", HeaderValue::from_static("a=1"));
        map.append("set-cookie", HeaderValue::from_static("b=2"));
        map.insert("content-type", HeaderValue::from_static("text/plain"));

        let headers = collect_headers(&map);
        assert_eq!(headers["set-cookie"], "a=1, b=2");
        assert_eq!(headers["content-type"], "text/plain");
    }

    #[test]
    fn test_header_map_sends_each_name_once() {
        let headers = BTreeMap::from([
            ("Content-Type".to_string(), "application/json".to_string()),
            ("content-type".to_string(), "text/plain".to_string()),
            ("X-Trace".to_string(), "7".to_string()),
        ]);
        let map = header_map(&headers).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_all("content-type").iter().count(), 1);
        assert_eq!(map["content-type"], "text/plain");
        assert_eq!(map["x-trace"], "7");
    }

    #[test]
    fn test_header_map_rejects_bad_names() {
        let headers = BTreeMap::from([("bad header".to_string(), "x".to_string())]);
        let failure = header_map(&headers).unwrap_err();
        assert!(failure.message.starts_with("Invalid header name"));
    }

    #[test]
    fn test_builder_defaults() {
        let builder = HttpExecutorBuilder::new();
        assert_eq!(builder.max_redirects, DEFAULT_MAX_REDIRECTS);
        assert_eq!(builder.connect_timeout, Duration::from_secs(10));
        assert!(builder.user_agent.starts_with("curlkit/"));
        assert_eq!(builder.policy, ExecutorPolicy::default());
    }

    #[tokio::test]
    async fn test_invalid_url_is_request_error() {
        let executor = HttpExecutor::new().unwrap();
        let resp = executor
            .execute(&RequestDescriptor::new("not a url"))
            .await;
        assert!(!resp.success);
        assert_eq!(resp.status, 0);
        assert_eq!(resp.status_text, "Request Error");
        assert!(resp.error.unwrap().starts_with("Invalid URL"));
    }

    #[tokio::test]
    async fn test_invalid_header_is_request_error() {
        let executor = HttpExecutor::new().unwrap();
        let descriptor = RequestDescriptor::new("http://127.0.0.1:1/")
            .with_method(Method::Get)
            .with_header("bad header", "x");
        let resp = executor.execute(&descriptor).await;
        assert_eq!(resp.status, 0);
        assert_eq!(resp.status_text, "Request Error");
        assert!(resp.error.is_some());
    }

    #[tokio::test]
    async fn test_unsupported_scheme_is_request_error() {
        let executor = HttpExecutor::new().unwrap();
        let resp = executor
            .execute(&RequestDescriptor::new("ftp://127.0.0.1/file"))
            .await;
        assert_eq!(resp.status, 0);
        assert_eq!(resp.status_text, "Request Error");
    }

    // Requests against a live local server are in tests/executor_tests.rs
}
