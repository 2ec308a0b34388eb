//! Curl command parser
//!
//! Converts a curl-style command string into a [`RequestDescriptor`].
//!
//! # Scope
//!
//! This is a best-effort pattern matcher, not a shell grammar. It does not
//! expand variables, follow line continuations, split pipelines or handle
//! nested/escaped quotes. Anything it does not recognize is ignored; the
//! only failures are a missing `curl` token and a missing URL.
//!
//! Recognized flags:
//!
//! | Flag | Effect |
//! |------|--------|
//! | `-X`, `--request` | method (uppercased) |
//! | `-H`, `--header` | header, argument must be quoted |
//! | `-d`, `--data`, `--data-ascii`, `--data-binary`, `--data-urlencode`, `--data-raw` | body, first occurrence only |
//! | `-u`, `--user` | basic auth |
//! | `-k`, `--insecure` | recognized, no effect |
//!
//! # Pass order
//!
//! Headers are scanned first (an `Authorization: Bearer ...` header also
//! sets bearer auth), then method and body, then basic auth. A `-u` flag
//! always overwrites auth derived from a header.

mod patterns;

use tracing::debug;

use crate::descriptor::{Auth, Method, RequestDescriptor};
use crate::error::{Error, Result};
use crate::logging_impl::LogConfig;

/// Parse a curl command string into a request descriptor.
///
/// The descriptor always carries the default timeout and follows
/// redirects; curl's own timeout and redirect flags are not read.
///
/// # Errors
///
/// - [`Error::InvalidCommand`] if the first token is not `curl`
/// - [`Error::MissingUrl`] if no http/https URL is present
pub fn parse_curl_command(command: &str) -> Result<RequestDescriptor> {
    let command = command.trim();
    if !starts_with_curl(command) {
        return Err(Error::InvalidCommand);
    }

    let url = patterns::URL
        .find(command)
        .ok_or(Error::MissingUrl)?
        .as_str()
        .to_string();
    let mut descriptor = RequestDescriptor::new(url);

    for (name, value) in extract_headers(command) {
        if let Some(token) = bearer_token(&name, &value) {
            descriptor.auth = Some(Auth::bearer(token));
        }
        descriptor.headers.insert(name, value);
    }

    let explicit_method = extract_method(command);
    descriptor.body = extract_body(command);
    descriptor.method = match explicit_method {
        Some(method) => method,
        None if descriptor.body.is_some() => Method::Post,
        None => Method::Get,
    };

    if let Some(auth) = extract_basic_auth(command) {
        descriptor.auth = Some(auth);
    }

    // Known gap: -k is accepted but never disables certificate validation.
    if patterns::INSECURE.is_match(command) {
        debug!("ignoring -k/--insecure: certificate validation is not configurable");
    }

    debug!(
        method = %descriptor.method,
        url = %LogConfig::default().redact_url(&descriptor.url),
        headers = descriptor.headers.len(),
        has_body = descriptor.body.is_some(),
        auth = descriptor.auth.as_ref().map_or("none", Auth::kind),
        "parsed curl command"
    );

    Ok(descriptor)
}

fn starts_with_curl(command: &str) -> bool {
    command
        .split_whitespace()
        .next()
        .is_some_and(|token| token.eq_ignore_ascii_case("curl"))
}

/// All quoted `Name: Value` header arguments, in order of appearance.
fn extract_headers(command: &str) -> Vec<(String, String)> {
    patterns::HEADER
        .captures_iter(command)
        .filter_map(|caps| patterns::first_group(&caps))
        .filter_map(|raw| {
            let (name, value) = raw.split_once(':')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn bearer_token(name: &str, value: &str) -> Option<String> {
    if !name.eq_ignore_ascii_case("authorization") {
        return None;
    }
    let scheme = value.get(..7)?;
    if scheme.eq_ignore_ascii_case("bearer ") {
        Some(value[7..].to_string())
    } else {
        None
    }
}

/// Explicit method flag. Values outside the supported set are ignored.
fn extract_method(command: &str) -> Option<Method> {
    let caps = patterns::METHOD.captures(command)?;
    let name = caps.get(1)?.as_str().to_ascii_uppercase();
    let method = Method::from_name(&name);
    if method.is_none() {
        debug!(method = %name, "ignoring unsupported request method");
    }
    method
}

fn extract_body(command: &str) -> Option<String> {
    let caps = patterns::DATA.captures(command)?;
    patterns::first_group(&caps).map(patterns::unescape)
}

fn extract_basic_auth(command: &str) -> Option<Auth> {
    let caps = patterns::USER.captures(command)?;
    let credentials = patterns::first_group(&caps)?;
    let (username, password) = credentials.split_once(':').unwrap_or((credentials, ""));
    Some(Auth::basic(username, password))
}
