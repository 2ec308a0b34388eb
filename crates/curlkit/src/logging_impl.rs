//! Log redaction for Curlkit
//!
//! Requests carry credentials in many places: basic auth in the URL,
//! bearer tokens and API keys in headers, tokens in query strings. Anything
//! the executor or parser logs about a request goes through [`LogConfig`].
//!
//! # Log Levels
//!
//! - **WARN**: Transport failures (no response, dispatch errors)
//! - **INFO**: One line per executed request (method, URL, status, duration)
//! - **DEBUG**: Parsed descriptors, outgoing headers, body size (body text
//!   only with [`LogConfig::unsafe_log_bodies`])

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use url::Url;

/// Replacement for redacted values.
const MASK: &str = "***";

/// Header name fragments treated as sensitive (lowercase, substring match).
const SENSITIVE_HEADER_FRAGMENTS: &[&str] = &[
    "authorization",
    "cookie",
    "token",
    "secret",
    "password",
    "api-key",
    "apikey",
    "session",
    "signature",
    "credential",
];

/// Query parameter names treated as sensitive (lowercase, exact match).
const SENSITIVE_QUERY_PARAMS: &[&str] = &[
    "access_token",
    "api_key",
    "apikey",
    "auth",
    "client_secret",
    "code",
    "id_token",
    "key",
    "password",
    "refresh_token",
    "secret",
    "sig",
    "signature",
    "token",
];

/// Header values starting with one of these carry a credential.
const CREDENTIAL_SCHEMES: &[&str] = &["bearer ", "basic ", "digest ", "token "];

/// Well-known API key prefixes.
const TOKEN_PREFIXES: &[&str] = &[
    "sk-",
    "sk_live_",
    "sk_test_",
    "pk_live_",
    "ghp_",
    "gho_",
    "github_pat_",
    "glpat-",
    "xoxb-",
    "xoxp-",
    "AKIA",
];

static EMBEDDED_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s()<>]+").expect("valid embedded URL pattern"));

/// Configuration for logging behavior
///
/// Redaction is on by default.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether to redact sensitive data from logs (default: true)
    pub redact_sensitive: bool,

    /// Header name fragments whose values are masked
    pub sensitive_headers: HashSet<String>,

    /// Query parameter names whose values are masked
    pub sensitive_params: HashSet<String>,

    /// Whether request bodies are logged as text (default: false)
    pub log_bodies: bool,

    /// Longest value logged before it is clipped (default: 200 bytes)
    pub max_value_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            redact_sensitive: true,
            sensitive_headers: SENSITIVE_HEADER_FRAGMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            sensitive_params: SENSITIVE_QUERY_PARAMS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            log_bodies: false,
            max_value_length: 200,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log credentials in clear (UNSAFE - local debugging only)
    pub fn unsafe_disable_redaction(mut self) -> Self {
        self.redact_sensitive = false;
        self
    }

    /// Also mask headers whose name contains `fragment`
    pub fn redact_header(mut self, fragment: &str) -> Self {
        self.sensitive_headers.insert(fragment.to_ascii_lowercase());
        self
    }

    /// Also mask the query parameter `name`
    pub fn redact_param(mut self, name: &str) -> Self {
        self.sensitive_params.insert(name.to_ascii_lowercase());
        self
    }

    /// Log request bodies as text (UNSAFE - bodies often hold credentials)
    pub fn unsafe_log_bodies(mut self) -> Self {
        self.log_bodies = true;
        self
    }

    pub fn max_value_length(mut self, len: usize) -> Self {
        self.max_value_length = len;
        self
    }

    pub fn is_sensitive_header(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.redact_sensitive
            && self
                .sensitive_headers
                .iter()
                .any(|fragment| name.contains(fragment.as_str()))
    }

    fn is_sensitive_param(&self, name: &str) -> bool {
        self.sensitive_params.contains(&name.to_ascii_lowercase())
    }

    /// Header value as it may be logged.
    pub fn header_value<'a>(&self, name: &str, value: &'a str) -> Cow<'a, str> {
        if self.is_sensitive_header(name) {
            Cow::Borrowed(MASK)
        } else {
            self.value(value)
        }
    }

    /// Arbitrary value as it may be logged. Values that look like
    /// credentials are masked whatever they are attached to.
    pub fn value<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if self.redact_sensitive && looks_like_secret(value) {
            Cow::Borrowed(MASK)
        } else {
            clip(value, self.max_value_length)
        }
    }

    /// URL as it may be logged: the password and sensitive query values
    /// are masked. Unparseable input is only clipped.
    pub fn redact_url<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        if !self.redact_sensitive {
            return clip(raw, self.max_value_length);
        }
        let Ok(mut url) = Url::parse(raw) else {
            return clip(raw, self.max_value_length);
        };

        let mut changed = false;
        if url.password().is_some() {
            changed = url.set_password(Some(MASK)).is_ok();
        }

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        if pairs.iter().any(|(name, _)| self.is_sensitive_param(name)) {
            let masked: Vec<(String, String)> = pairs
                .into_iter()
                .map(|(name, value)| {
                    if self.is_sensitive_param(&name) {
                        (name, MASK.to_string())
                    } else {
                        (name, value)
                    }
                })
                .collect();
            url.query_pairs_mut().clear().extend_pairs(masked);
            changed = true;
        }

        if changed {
            Cow::Owned(clip(url.as_str(), self.max_value_length).into_owned())
        } else {
            clip(raw, self.max_value_length)
        }
    }

    /// Free text (error messages) with every embedded URL redacted and
    /// control characters escaped.
    pub fn redact_text(&self, text: &str) -> String {
        let redacted = EMBEDDED_URL.replace_all(text, |caps: &Captures<'_>| {
            self.redact_url(&caps[0]).into_owned()
        });
        sanitize_for_log(&redacted)
    }
}

/// Cut `value` to at most `max` bytes on a char boundary.
fn clip(value: &str, max: usize) -> Cow<'_, str> {
    if value.len() <= max {
        return Cow::Borrowed(value);
    }
    let end = (0..=max)
        .rev()
        .find(|&i| value.is_char_boundary(i))
        .unwrap_or(0);
    Cow::Owned(format!(
        "{}...(+{} bytes)",
        &value[..end],
        value.len() - end
    ))
}

fn looks_like_secret(value: &str) -> bool {
    let value = value.trim();
    let lower = value.to_ascii_lowercase();
    CREDENTIAL_SCHEMES
        .iter()
        .any(|scheme| lower.starts_with(scheme))
        || is_jwt(value)
        || TOKEN_PREFIXES
            .iter()
            .any(|prefix| value.starts_with(prefix) && value.len() > prefix.len() + 8)
        || is_random_token(value)
}

fn is_base64url_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'=')
}

fn is_jwt(value: &str) -> bool {
    let parts: Vec<&str> = value.split('.').collect();
    parts.len() == 3
        && parts[0].starts_with("eyJ")
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(is_base64url_byte))
}

/// Long mixed alphanumeric string with high Shannon entropy.
fn is_random_token(value: &str) -> bool {
    value.len() >= 24
        && value.bytes().all(is_base64url_byte)
        && value.bytes().any(|b| b.is_ascii_digit())
        && value.bytes().any(|b| b.is_ascii_alphabetic())
        && shannon_entropy(value) >= 3.5
}

fn shannon_entropy(value: &str) -> f64 {
    let mut counts = [0usize; 256];
    for b in value.bytes() {
        counts[usize::from(b)] += 1;
    }
    let len = value.len() as f64;
    counts
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Escape control characters so a logged value cannot forge log lines.
pub fn sanitize_for_log(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_control() {
            out.extend(c.escape_default());
        } else {
            out.push(c);
        }
    }
    out
}

/// Headers as `Name: value` pairs, sensitive values masked.
pub fn format_headers_for_log(headers: &BTreeMap<String, String>, config: &LogConfig) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            format!(
                "{}: {}",
                sanitize_for_log(name),
                sanitize_for_log(&config.header_value(name, value))
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Body size, or the clipped body text when body logging is enabled.
pub fn format_body_for_log(body: &str, config: &LogConfig) -> String {
    if config.log_bodies {
        clip(&sanitize_for_log(body), config.max_value_length).into_owned()
    } else {
        format!("[body: {} bytes]", body.len())
    }
}
