//! The request executor.
//!
//! # Design
//! `JsonRequest::new` does every fallible, synchronous step up front: URL
//! parsing, method and header validation, body serialization, and transport
//! selection. What is left for an invocation is the exchange itself, which
//! is split the same way as the response side: `build_request` produces a
//! `reqwest::Request`, the transport executes it, and `parse_response`
//! classifies the accumulated body.
//!
//! The timer wraps the whole exchange and is armed before the exchange is
//! first polled. Whichever finishes first settles the invocation; the loser
//! is dropped, which for an in-flight exchange closes the socket.

use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use percent_encoding::percent_decode_str;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE,
};
use reqwest::{Body, Method};
use tracing::{debug, warn};
use url::Url;

use crate::config::RequestConfig;
use crate::error::{ConfigError, RequestFailure};
use crate::http::{collect_headers, parse_response, JsonResponse};
use crate::transport::{standard_transports, Transport, TransportTable};

/// A validated, reusable request.
///
/// Each call to `send` or `invoke` performs one independent exchange.
#[derive(Debug, Clone)]
pub struct JsonRequest {
    url: Url,
    method: Method,
    headers: HeaderMap,
    body: String,
    timeout: Duration,
    transport: Arc<dyn Transport>,
}

impl JsonRequest {
    /// Validate `config` and bind it to the standard transports.
    pub fn new(config: RequestConfig) -> Result<Self, ConfigError> {
        Self::with_transports(config, standard_transports()?)
    }

    pub fn with_transports(
        config: RequestConfig,
        transports: &TransportTable,
    ) -> Result<Self, ConfigError> {
        let mut url = Url::parse(&config.url).map_err(|source| ConfigError::InvalidUrl {
            url: config.url.clone(),
            source,
        })?;
        let transport = transports.select(url.scheme());

        let method = Method::from_bytes(config.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| ConfigError::InvalidMethod(config.method.clone()))?;

        let body = serde_json::to_string(&config.body)?;
        let mut headers = assemble_headers(&config.headers, body.len())?;
        apply_userinfo(&mut url, &mut headers)?;

        Ok(Self {
            url,
            method,
            headers,
            body,
            timeout: config.timeout,
            transport,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The serialized request body.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// The wire request for one exchange. The body is sent for every
    /// method, GET included.
    pub fn build_request(&self) -> reqwest::Request {
        let mut request = reqwest::Request::new(self.method.clone(), self.url.clone());
        *request.headers_mut() = self.headers.clone();
        *request.body_mut() = Some(Body::from(self.body.clone()));
        request
    }

    /// Perform one exchange and settle it.
    pub async fn send(&self) -> Result<JsonResponse, RequestFailure> {
        debug!(method = %self.method, url = %self.url, transport = self.transport.name(), "dispatching request");
        let exchange = self.exchange(self.build_request());

        if self.timeout.is_zero() {
            return exchange.await;
        }

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    method = %self.method,
                    url = %self.url,
                    timeout = ?self.timeout,
                    "request timed out, connection dropped"
                );
                Err(RequestFailure::Timeout(self.timeout))
            }
        }
    }

    /// Fire the request on the current Tokio runtime.
    ///
    /// Returns immediately. Exactly one of `on_success` or `on_error` runs
    /// later on a spawned task, never inside this call.
    ///
    /// # Cancellation
    /// The callbacks live on the spawned task. If the runtime shuts down
    /// before that task finishes, the task is dropped and neither callback
    /// runs. Keep the runtime alive until the outcome arrives.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime, as `tokio::spawn` does.
    pub fn invoke<S, E>(&self, on_success: S, on_error: E)
    where
        S: FnOnce(JsonResponse) + Send + 'static,
        E: FnOnce(RequestFailure) + Send + 'static,
    {
        let request = self.clone();
        tokio::spawn(async move {
            match request.send().await {
                Ok(response) => on_success(response),
                Err(failure) => on_error(failure),
            }
        });
    }

    async fn exchange(&self, request: reqwest::Request) -> Result<JsonResponse, RequestFailure> {
        let mut response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| {
                debug!(url = %self.url, error = %e, "transport error");
                RequestFailure::Request(e)
            })?;

        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());

        let mut raw = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(RequestFailure::Request)? {
            raw.extend_from_slice(&chunk);
        }
        debug!(url = %self.url, status, bytes = raw.len(), "response complete");

        parse_response(status, headers, &raw).inspect_err(|e| {
            debug!(url = %self.url, error = %e, "response body rejected");
        })
    }
}

/// `Content-Type: application/json`, then caller headers in order, then a
/// `Content-Length` that always reflects the serialized body's byte length.
fn assemble_headers(
    caller: &[(String, String)],
    body_len: usize,
) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in caller {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::InvalidHeaderName(name.clone()))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| ConfigError::InvalidHeaderValue(name.clone()))?;
        headers.insert(header_name, header_value);
    }

    headers.insert(CONTENT_LENGTH, HeaderValue::from(body_len));
    Ok(headers)
}

/// Move `user:pass@` from the URL into `Authorization: Basic`, unless the
/// caller already set `Authorization`. The credentials are removed from the
/// URL either way so they never reach the request line.
fn apply_userinfo(url: &mut Url, headers: &mut HeaderMap) -> Result<(), ConfigError> {
    if url.username().is_empty() && url.password().is_none() {
        return Ok(());
    }

    if !headers.contains_key(AUTHORIZATION) {
        let username = percent_decode_str(url.username()).decode_utf8_lossy();
        let password = percent_decode_str(url.password().unwrap_or("")).decode_utf8_lossy();
        let encoded = STANDARD.encode(format!("{username}:{password}"));
        let value = HeaderValue::from_str(&format!("Basic {encoded}"))
            .map_err(|_| ConfigError::InvalidHeaderValue(AUTHORIZATION.to_string()))?;
        headers.insert(AUTHORIZATION, value);
    }

    // Only cannot-be-a-base URLs reject these, and they carry no userinfo.
    let _ = url.set_username("");
    let _ = url.set_password(None);
    Ok(())
}
