//! HTTP Façade Tests
//!
//! Requests go through `tower::ServiceExt::oneshot`; remote calls hit the
//! local test server.
//!
//! Run with: `cargo test --features server api`

#![cfg(feature = "server")]

mod common;

use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use axum::response::Response;
use curlkit::HttpExecutor;
use curlkit::api::router;
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> axum::Router {
    router(Arc::new(HttpExecutor::new().unwrap()))
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str, body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

// --- health ---

#[tokio::test]
async fn health_reports_service() {
    let resp = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "curlkit");
    assert_eq!(body["version"], curlkit::VERSION);
    assert!(body["timestamp"].as_str().unwrap().contains('T'));
}

// --- execute_curl ---

#[tokio::test]
async fn execute_curl_returns_descriptor() {
    let base = common::spawn_server().await;
    let resp = app()
        .oneshot(post(
            "/api/execute_curl",
            json!({"curlCommand": format!("curl {base}/json")}).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], 200);
    assert!(body["body"].as_str().unwrap().contains("\"name\": \"curlkit\""));
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn execute_curl_remote_error_is_still_200() {
    let base = common::spawn_server().await;
    let resp = app()
        .oneshot(post(
            "/api/execute_curl",
            json!({"curlCommand": format!("curl {base}/status/500")}).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["status"], 500);
    assert_eq!(body["error"], "HTTP 500: Internal Server Error");
}

#[tokio::test]
async fn execute_curl_malformed_json_is_400() {
    let resp = app()
        .oneshot(post("/api/execute_curl", "{not json"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
}

#[tokio::test]
async fn execute_curl_missing_field_is_400() {
    let resp = app()
        .oneshot(post("/api/execute_curl", "{}"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await,
        json!({
            "success": false,
            "error": "Invalid input",
            "details": [{"path": "curlCommand", "message": "Required"}]
        })
    );
}

#[tokio::test]
async fn execute_curl_parser_error_is_400() {
    let resp = app()
        .oneshot(post(
            "/api/execute_curl",
            json!({"curlCommand": "wget https://example.com"}).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await,
        json!({"success": false, "error": "Invalid curl command: must start with 'curl'"})
    );
}

// --- http_request ---

#[tokio::test]
async fn http_request_returns_descriptor() {
    let base = common::spawn_server().await;
    let resp = app()
        .oneshot(post(
            "/api/http_request",
            json!({"url": format!("{base}/status/404")}).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["statusText"], "Not Found");
    assert_eq!(body["headers"]["x-test"], "yes");
    assert_eq!(body["body"], "status 404");
    assert_eq!(body["bodySize"], 10);
}

#[tokio::test]
async fn http_request_invalid_input_is_400() {
    let resp = app()
        .oneshot(post(
            "/api/http_request",
            json!({"url": "not-a-url", "method": "TRACE"}).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "Invalid input");
    let paths: Vec<_> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["path"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(paths, vec!["url", "method"]);
}

#[tokio::test]
async fn http_request_unreachable_is_200_with_status_zero() {
    let resp = app()
        .oneshot(post(
            "/api/http_request",
            json!({"url": "http://127.0.0.1:1/"}).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["status"], 0);
    assert_eq!(body["headers"], json!({}));
    assert_eq!(body["body"], "");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let resp = app()
        .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
