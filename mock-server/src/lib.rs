use std::collections::BTreeMap;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use uuid::Uuid;

pub mod tls;

pub const ECHO_ID: &str = "x-echo-id";
pub const DEFAULT_DELAY_MS: u64 = 500;

/// What the echo routes send back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub body: Value,
}

#[derive(Deserialize)]
pub struct Delay {
    pub ms: Option<u64>,
}

pub fn app() -> Router {
    Router::new()
        .route("/", any(echo))
        .route("/echo", any(echo))
        .route("/slow", any(slow))
        .route("/invalid", get(invalid_json))
        .route("/empty", get(empty))
        .route("/headers", any(echo_headers))
        .route("/status/{code}", any(status))
        .route("/cookies", get(cookies))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn stamped(status: StatusCode, body: impl IntoResponse) -> Response {
    let mut response = (status, body).into_response();
    if let Ok(id) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(ECHO_ID), id);
    }
    response
}

async fn echo(method: Method, body: Bytes) -> Response {
    let parsed = if body.is_empty() {
        Ok(Value::Object(Default::default()))
    } else {
        serde_json::from_slice::<Value>(&body)
    };
    match parsed {
        Ok(body) => stamped(
            StatusCode::OK,
            Json(Echo {
                method: method.to_string(),
                body,
            }),
        ),
        Err(e) => stamped(
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

async fn slow(Query(delay): Query<Delay>, method: Method, body: Bytes) -> Response {
    let ms = delay.ms.unwrap_or(DEFAULT_DELAY_MS);
    tracing::debug!(ms, "delaying response");
    tokio::time::sleep(Duration::from_millis(ms)).await;
    echo(method, body).await
}

async fn invalid_json() -> Response {
    stamped(
        StatusCode::OK,
        ([(header::CONTENT_TYPE, "application/json")], "Invalid JSON"),
    )
}

async fn empty() -> Response {
    stamped(
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
    )
}

async fn echo_headers(headers: HeaderMap) -> Response {
    let seen: BTreeMap<String, String> = headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                String::from_utf8_lossy(v.as_bytes()).into_owned(),
            )
        })
        .collect();
    stamped(StatusCode::OK, Json(seen))
}

async fn status(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status) => stamped(status, Json(serde_json::json!({ "status": code }))),
        Err(_) => stamped(
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": format!("invalid status {code}") })),
        ),
    }
}

async fn cookies() -> Response {
    stamped(
        StatusCode::OK,
        (
            AppendHeaders([
                (header::SET_COOKIE, "session=abc; Path=/"),
                (header::SET_COOKIE, "theme=dark; Path=/"),
            ]),
            Json(serde_json::json!({})),
        ),
    )
}
