use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo, ECHO_ID};
use std::collections::BTreeMap;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_empty_body_as_empty_object() {
    let resp = app().oneshot(get("/")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key(ECHO_ID));
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.body, serde_json::json!({}));
}

#[tokio::test]
async fn echo_returns_method_and_body() {
    let resp = app()
        .oneshot(json_request("POST", "/echo", r#"{"key":"value"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.body, serde_json::json!({"key": "value"}));
}

#[tokio::test]
async fn echo_malformed_json_returns_400() {
    let resp = app()
        .oneshot(json_request("PUT", "/echo", "{not json"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn echo_ids_are_unique() {
    let first = app().oneshot(get("/")).await.unwrap();
    let second = app().oneshot(get("/")).await.unwrap();
    assert_ne!(first.headers()[ECHO_ID], second.headers()[ECHO_ID]);
}

// --- fixed bodies ---

#[tokio::test]
async fn invalid_returns_non_json_text() {
    let resp = app().oneshot(get("/invalid")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_bytes(resp).await[..], b"Invalid JSON");
}

#[tokio::test]
async fn empty_returns_no_body() {
    let resp = app().oneshot(get("/empty")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn slow_echoes_after_delay() {
    let started = std::time::Instant::now();
    let resp = app()
        .oneshot(json_request("POST", "/slow?ms=20", r#"{"n":1}"#))
        .await
        .unwrap();

    assert!(started.elapsed() >= std::time::Duration::from_millis(20));
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.body, serde_json::json!({"n": 1}));
}

// --- headers ---

#[tokio::test]
async fn headers_are_reflected() {
    let req = Request::builder()
        .uri("/headers")
        .header("X-Test", "1")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    let seen: BTreeMap<String, String> = body_json(resp).await;
    assert_eq!(seen.get("x-test").map(String::as_str), Some("1"));
}

#[tokio::test]
async fn cookies_are_sent_separately() {
    let resp = app().oneshot(get("/cookies")).await.unwrap();

    let cookies: Vec<_> = resp
        .headers()
        .get_all(http::header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies, vec!["session=abc; Path=/", "theme=dark; Path=/"]);
}

// --- status ---

#[tokio::test]
async fn status_route_uses_requested_code() {
    let resp = app().oneshot(get("/status/404")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({"status": 404}));
}

#[tokio::test]
async fn status_route_rejects_out_of_range_code() {
    let resp = app().oneshot(get("/status/1000")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_route_rejects_non_numeric_code() {
    let resp = app().oneshot(get("/status/teapot")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
