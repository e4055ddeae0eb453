//! Response types and the response-side half of an exchange.
//!
//! # Design
//! A `JsonResponse` is a fully buffered response: status, flattened headers,
//! and the body already parsed as JSON. `parse_response` is the pure step
//! that turns accumulated bytes into either a `JsonResponse` or a
//! `RequestFailure::Parse`, so it can be tested without a socket.

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, SET_COOKIE};
use serde::Serialize;
use serde_json::Value;

use crate::error::RequestFailure;

/// A response header value.
///
/// Most headers collapse to a single string. `set-cookie` is always a list
/// because its values cannot be joined with commas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Single(String),
    Multiple(Vec<String>),
}

impl HeaderValue {
    /// The first value, whichever variant this is.
    pub fn first(&self) -> Option<&str> {
        match self {
            HeaderValue::Single(value) => Some(value),
            HeaderValue::Multiple(values) => values.first().map(String::as_str),
        }
    }
}

/// A successful exchange: the transport completed and the body was JSON.
///
/// Non-2xx statuses still land here. Callers inspect `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonResponse {
    pub status: u16,
    pub headers: BTreeMap<String, HeaderValue>,
    pub body: Value,
}

impl JsonResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup returning the first value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(HeaderValue::first)
    }
}

/// Flatten a header map into lowercase names.
pub fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, HeaderValue> {
    headers
        .keys()
        .map(|name| {
            let values: Vec<String> = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect();
            let value = if *name == SET_COOKIE {
                HeaderValue::Multiple(values)
            } else if values.len() == 1 {
                HeaderValue::Single(values.into_iter().next().unwrap_or_default())
            } else {
                HeaderValue::Single(values.join(", "))
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}

/// Turn an accumulated body into a `JsonResponse`.
///
/// An empty body is `{}`. Anything else must be valid JSON; whitespace-only
/// text is not.
pub fn parse_response(
    status: u16,
    headers: BTreeMap<String, HeaderValue>,
    raw: &[u8],
) -> Result<JsonResponse, RequestFailure> {
    let text = String::from_utf8_lossy(raw);
    let body = if text.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_str(&text).map_err(|source| RequestFailure::Parse {
            source,
            raw_response: text.into_owned(),
        })?
    };
    Ok(JsonResponse {
        status,
        headers,
        body,
    })
}
