//! HTTP façade over the tools
//!
//! | Route | Body | Response |
//! |-------|------|----------|
//! | `POST /api/execute_curl` | `{"curlCommand": "..."}` | [`ResponseDescriptor`] |
//! | `POST /api/http_request` | [`HttpRequestInput`] | [`ResponseDescriptor`] |
//! | `GET /health` | | `{"status": "ok", ...}` |
//!
//! An executed request is always `200`, whatever the remote status was.
//! Malformed JSON, invalid input and unparseable curl commands are `400`
//! with an [`ErrorPayload`]; anything unexpected, including a panic while
//! handling the request, is `500`.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::descriptor::ResponseDescriptor;
use crate::error::Error;
use crate::network::HttpExecutor;
use crate::tool::{
    CurlTool, ErrorPayload, ExecuteCurlInput, HttpRequestInput, HttpRequestTool, VERSION,
};

/// Service name reported by `/health`.
pub const SERVICE_NAME: &str = "curlkit";

#[derive(Clone)]
struct AppState {
    curl: CurlTool,
    http: HttpRequestTool,
}

/// Build the router. All routes share `executor`.
pub fn router(executor: Arc<HttpExecutor>) -> Router {
    let state = AppState {
        curl: CurlTool::new(Arc::clone(&executor)),
        http: HttpRequestTool::new(executor),
    };
    Router::new()
        .route("/api/execute_curl", post(execute_curl))
        .route("/api/http_request", post(http_request))
        .route("/health", get(health))
        .with_state(state)
}

/// Serve the router on `listener` until the server fails.
pub async fn serve(listener: TcpListener, executor: Arc<HttpExecutor>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "http façade listening");
    }
    axum::serve(listener, router(executor)).await
}

/// Error response of the façade.
#[derive(Debug)]
pub enum ApiError {
    /// 400: the request body was unusable
    BadRequest(ErrorPayload),
    /// 500: unexpected failure
    Internal(ErrorPayload),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let payload = ErrorPayload::from(&err);
        match err {
            Error::InvalidCommand | Error::MissingUrl | Error::Validation(_) => {
                ApiError::BadRequest(payload)
            }
            Error::Client(_) | Error::Internal(_) => ApiError::Internal(payload),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, payload) = match self {
            ApiError::BadRequest(payload) => (StatusCode::BAD_REQUEST, payload),
            ApiError::Internal(payload) => {
                tracing::error!(error = %payload.error, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, payload)
            }
        };
        (status, Json(payload)).into_response()
    }
}

fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(ErrorPayload::new(format!("Invalid JSON body: {e}"))))
}

/// Run a handler body on its own task. A panic there becomes
/// [`Error::Internal`] and a 500 response.
async fn guarded<T, F>(work: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(work).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(Error::Internal("request handler panicked".into()).into()),
        Err(_) => Err(Error::Internal("request handler was cancelled".into()).into()),
    }
}

async fn execute_curl(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ResponseDescriptor>, ApiError> {
    guarded(async move {
        let input = ExecuteCurlInput::from_value(&parse_body(&body)?)?;
        Ok(Json(state.curl.run(&input).await?))
    })
    .await
}

async fn http_request(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ResponseDescriptor>, ApiError> {
    guarded(async move {
        let input = HttpRequestInput::from_value(&parse_body(&body)?)?;
        Ok(Json(state.http.run(input).await))
    })
    .await
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        service: SERVICE_NAME,
        version: VERSION,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_errors_are_bad_requests() {
        for err in [Error::InvalidCommand, Error::MissingUrl, Error::validation("url", "Required")] {
            assert!(matches!(ApiError::from(err), ApiError::BadRequest(_)));
        }
    }

    #[test]
    fn test_internal_errors() {
        let resp = ApiError::from(Error::Internal("boom".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_panicking_handler_is_internal_error() {
        let result: Result<(), ApiError> = guarded(async {
            if SERVICE_NAME.is_empty() {
                return Ok(());
            }
            panic!("handler bug");
        })
        .await;

        match result {
            Err(ApiError::Internal(payload)) => {
                assert_eq!(payload.error, "internal error: request handler panicked");
                assert!(!payload.success);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_guarded_passes_results_through() {
        let ok: Result<u8, ApiError> = guarded(async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let bad: Result<u8, ApiError> = guarded(async { Err(Error::MissingUrl.into()) }).await;
        assert!(matches!(bad, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_invalid_json_message() {
        match parse_body(&Bytes::from_static(b"{oops")) {
            Err(ApiError::BadRequest(payload)) => {
                assert!(payload.error.starts_with("Invalid JSON body"));
                assert!(!payload.success);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
