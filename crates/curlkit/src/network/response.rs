//! Response normalization
//!
//! Turns whatever the transport produced (a response of any status, or a
//! failure) into a [`ResponseDescriptor`].

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use crate::descriptor::ResponseDescriptor;

/// Status text for requests that were sent but got no reply.
pub const NO_RESPONSE: &str = "No Response";

/// Status text for unclassified transport failures.
pub const UNKNOWN_ERROR: &str = "Unknown Error";

/// Status text for requests that could not be dispatched.
pub const REQUEST_ERROR: &str = "Request Error";

/// Why no response was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailureKind {
    /// The request could not be built or sent (bad URL, bad header, ...)
    Dispatch,
    /// Sent, but no reply arrived (connect error, timeout, redirect limit)
    NoResponse,
    /// Any other transport failure
    Unknown,
}

impl TransportFailureKind {
    pub fn status_text(self) -> &'static str {
        match self {
            TransportFailureKind::Dispatch => REQUEST_ERROR,
            TransportFailureKind::NoResponse => NO_RESPONSE,
            TransportFailureKind::Unknown => UNKNOWN_ERROR,
        }
    }
}

impl fmt::Display for TransportFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportFailureKind::Dispatch => "dispatch",
            TransportFailureKind::NoResponse => "no_response",
            TransportFailureKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A request that ended without a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub kind: TransportFailureKind,
    pub message: String,
}

impl TransportFailure {
    pub fn new(kind: TransportFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn dispatch(message: impl Into<String>) -> Self {
        Self::new(TransportFailureKind::Dispatch, message)
    }

    /// Classify a reqwest error.
    pub(crate) fn from_reqwest(err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_builder() {
            Self::dispatch(error_chain(err))
        } else if err.is_timeout() {
            Self::new(
                TransportFailureKind::NoResponse,
                format!("timeout of {timeout_ms}ms exceeded"),
            )
        } else if err.is_connect() || err.is_request() || err.is_redirect() || err.is_body() {
            Self::new(TransportFailureKind::NoResponse, error_chain(err))
        } else {
            Self::new(TransportFailureKind::Unknown, error_chain(err))
        }
    }
}

/// Error message followed by its sources, joined with `": "`.
pub(crate) fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Render a payload as text.
///
/// JSON objects and arrays are pretty-printed with their key order kept;
/// everything else (plain text, HTML, JSON scalars, invalid UTF-8 decoded
/// lossily) passes through unchanged.
pub fn render_body(payload: &[u8]) -> String {
    let text = String::from_utf8_lossy(payload);
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) => {
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| text.into_owned())
        }
        _ => text.into_owned(),
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl ResponseDescriptor {
    /// A response was received. Any status is accepted; non-2xx statuses
    /// produce `success = false` and an `HTTP {status}: {text}` error.
    pub fn received(
        status: u16,
        status_text: impl Into<String>,
        headers: BTreeMap<String, String>,
        body: String,
        duration: Duration,
    ) -> Self {
        let status_text = status_text.into();
        let success = (200..300).contains(&status);
        let error = (!success).then(|| format!("HTTP {status}: {status_text}"));
        Self {
            success,
            status,
            status_text,
            headers,
            body_size: body.len(),
            body,
            duration_ms: duration_ms(duration),
            error,
        }
    }

    /// No response was received.
    pub fn failed(failure: TransportFailure, duration: Duration) -> Self {
        Self {
            success: false,
            status: 0,
            status_text: failure.kind.status_text().to_string(),
            headers: BTreeMap::new(),
            body: String::new(),
            body_size: 0,
            duration_ms: duration_ms(duration),
            error: Some(failure.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_pretty_prints_objects_in_order() {
        let rendered = render_body(br#"{"b":1,"a":[1,2]}"#);
        assert_eq!(rendered, "{\n  \"b\": 1,\n  \"a\": [\n    1,\n    2\n  ]\n}");
    }

    #[test]
    fn test_render_arrays() {
        assert_eq!(render_body(b"[]"), "[]");
        assert_eq!(render_body(b" [1] "), "[\n  1\n]");
    }

    #[test]
    fn test_render_passes_text_through() {
        assert_eq!(render_body(b"hello world"), "hello world");
        assert_eq!(render_body(b"<html></html>"), "<html></html>");
        assert_eq!(render_body(b"{not json"), "{not json");
        assert_eq!(render_body(b""), "");
    }

    #[test]
    fn test_render_scalars_unchanged() {
        assert_eq!(render_body(b"42"), "42");
        assert_eq!(render_body(b"\"quoted\""), "\"quoted\"");
        assert_eq!(render_body(b"true"), "true");
    }

    #[test]
    fn test_duration_ms_saturates() {
        assert_eq!(duration_ms(Duration::from_micros(1_999)), 1);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_render_invalid_utf8_lossy() {
        assert_eq!(render_body(&[0x68, 0x69, 0xff]), "hi\u{fffd}");
    }

    #[test]
    fn test_received_success() {
        let resp = ResponseDescriptor::received(
            204,
            "No Content",
            BTreeMap::new(),
            String::new(),
            Duration::from_millis(12),
        );
        assert!(resp.success);
        assert_eq!(resp.error, None);
        assert_eq!(resp.body_size, 0);
        assert_eq!(resp.duration_ms, 12);
    }

    #[test]
    fn test_received_not_found() {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        let resp = ResponseDescriptor::received(
            404,
            "Not Found",
            headers.clone(),
            "missing".to_string(),
            Duration::ZERO,
        );
        assert!(!resp.success);
        assert_eq!(resp.status, 404);
        assert_eq!(resp.error.as_deref(), Some("HTTP 404: Not Found"));
        assert_eq!(resp.headers, headers);
        assert_eq!(resp.body, "missing");
        assert_eq!(resp.body_size, 7);
    }

    #[test]
    fn test_received_redirect_is_not_success() {
        let resp = ResponseDescriptor::received(
            302,
            "Found",
            BTreeMap::new(),
            String::new(),
            Duration::ZERO,
        );
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("HTTP 302: Found"));
    }

    #[test]
    fn test_body_size_counts_utf8_bytes() {
        let resp = ResponseDescriptor::received(
            200,
            "OK",
            BTreeMap::new(),
            "héllo".to_string(),
            Duration::ZERO,
        );
        assert_eq!(resp.body_size, 6);
    }

    #[test]
    fn test_failed_shapes() {
        let cases = [
            (TransportFailureKind::Dispatch, "Request Error"),
            (TransportFailureKind::NoResponse, "No Response"),
            (TransportFailureKind::Unknown, "Unknown Error"),
        ];
        for (kind, status_text) in cases {
            let resp = ResponseDescriptor::failed(
                TransportFailure::new(kind, "boom"),
                Duration::from_millis(3),
            );
            assert!(!resp.success);
            assert_eq!(resp.status, 0);
            assert_eq!(resp.status_text, status_text);
            assert!(resp.headers.is_empty());
            assert_eq!(resp.body, "");
            assert_eq!(resp.body_size, 0);
            assert_eq!(resp.duration_ms, 3);
            assert_eq!(resp.error.as_deref(), Some("boom"));
        }
    }

    #[test]
    fn test_response_json_shape() {
        let resp = ResponseDescriptor::received(
            200,
            "OK",
            BTreeMap::new(),
            "ok".to_string(),
            Duration::ZERO,
        );
        let json = serde_json::to_value(&resp).unwrap_or_default();
        assert_eq!(json["statusText"], "OK");
        assert_eq!(json["bodySize"], 2);
        assert_eq!(json["durationMs"], 0);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_error_chain_dedupes() {
        #[derive(Debug)]
        struct Outer(std::io::Error);
        impl fmt::Display for Outer {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "request failed")
            }
        }
        impl StdError for Outer {
            fn source(&self) -> Option<&(dyn StdError + 'static)> {
                Some(&self.0)
            }
        }

        let err = Outer(std::io::Error::other("connection refused"));
        assert_eq!(error_chain(&err), "request failed: connection refused");
    }
}
