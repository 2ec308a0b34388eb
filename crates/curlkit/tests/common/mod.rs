//! Local HTTP server for integration tests
//!
//! Binds `127.0.0.1:0` so tests never touch the external network.

#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Bytes,
    extract::Path,
    http::{HeaderMap, Method, StatusCode, header},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{any, get},
};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// How long `/slow` waits before answering.
pub const SLOW_DELAY: Duration = Duration::from_secs(2);

fn app() -> Router {
    Router::new()
        .route("/json", get(json_body))
        .route("/text", get(|| async { "hello world" }))
        .route("/cookies", get(cookies))
        .route("/status/{code}", get(status))
        .route("/redirect/{n}", get(redirect))
        .route("/slow", get(slow))
        .route("/echo", any(echo))
}

/// Start the server and return its base URL (`http://127.0.0.1:PORT`).
pub async fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app()).await.unwrap();
    });
    format!("http://{addr}")
}

async fn json_body() -> Response {
    (
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"name":"curlkit","tags":["a","b"]}"#,
    )
        .into_response()
}

async fn cookies() -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, "a=1"), (header::SET_COOKIE, "b=2")]),
        "cookies",
    )
        .into_response()
}

async fn status(Path(code): Path<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, [("x-test", "yes")], format!("status {code}")).into_response()
}

async fn redirect(Path(n): Path<u32>) -> Response {
    if n == 0 {
        return "done".into_response();
    }
    (
        StatusCode::FOUND,
        [(header::LOCATION, format!("/redirect/{}", n - 1))],
    )
        .into_response()
}

async fn slow() -> &'static str {
    tokio::time::sleep(SLOW_DELAY).await;
    "late"
}

/// Reflects method, lowercased headers and the raw body. A header sent
/// more than once comes back with its values joined by `" | "`.
async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let headers: Map<String, Value> = headers
        .keys()
        .map(|name| {
            let values: Vec<_> = headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                .collect();
            (name.as_str().to_string(), Value::String(values.join(" | ")))
        })
        .collect();
    Json(json!({
        "method": method.as_str(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    }))
}

/// Parse a response body produced by `/echo`.
pub fn echoed(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

/// Accept one connection, answer it with `response` verbatim and hand back
/// the raw request head. Returns the base URL and the captured head.
pub async fn spawn_raw(response: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut chunk = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&chunk[..n]);
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        let _ = tx.send(String::from_utf8_lossy(&head).into_owned());
    });
    (format!("http://{addr}"), rx)
}

/// Header lines of a raw request head whose name matches `name`, any case.
pub fn header_lines<'a>(head: &'a str, name: &str) -> Vec<&'a str> {
    head.lines()
        .filter(|line| {
            line.split_once(':')
                .is_some_and(|(n, _)| n.trim().eq_ignore_ascii_case(name))
        })
        .collect()
}

/// A minimal `200` answer for [`spawn_raw`].
pub const RAW_OK: &str = "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok";
