//! Error types for request construction and execution.
//!
//! # Design
//! Two enums for two moments. `ConfigError` is returned synchronously while
//! a `JsonRequest` is being built: a bad URL, method, or header is a caller
//! bug and never reaches the error continuation. `RequestFailure` is the
//! asynchronous outcome of an exchange and is always one of three kinds.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Errors raised while validating a `RequestConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),

    #[error("invalid header name `{0}`")]
    InvalidHeaderName(String),

    #[error("invalid value for header `{0}`")]
    InvalidHeaderValue(String),

    /// The request body could not be serialized to JSON.
    #[error("request body could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The built-in transports could not be initialized.
    #[error("transport setup failed: {0}")]
    Transport(#[source] reqwest::Error),
}

/// The three ways an issued request can fail.
#[derive(Debug, thiserror::Error)]
pub enum RequestFailure {
    /// Connection refused, DNS failure, reset, TLS failure, or a body read
    /// error.
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The configured duration elapsed first; the connection was dropped.
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The body arrived in full but is not JSON.
    #[error("response body is not valid JSON: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        raw_response: String,
    },
}

/// Discriminant of a `RequestFailure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    #[serde(rename = "RequestError")]
    Request,
    #[serde(rename = "TimeoutError")]
    Timeout,
    #[serde(rename = "ParseError")]
    Parse,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Request => "RequestError",
            FailureKind::Timeout => "TimeoutError",
            FailureKind::Parse => "ParseError",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable summary of a failure, for logs and command-line output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport {
    #[serde(rename = "type")]
    pub kind: FailureKind,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl RequestFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            RequestFailure::Request(_) => FailureKind::Request,
            RequestFailure::Timeout(_) => FailureKind::Timeout,
            RequestFailure::Parse { .. } => FailureKind::Parse,
        }
    }

    /// The unparsed body, present only for parse failures.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            RequestFailure::Parse { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    pub fn report(&self) -> FailureReport {
        let error = match self {
            RequestFailure::Request(source) => source.to_string(),
            RequestFailure::Timeout(_) => self.to_string(),
            RequestFailure::Parse { source, .. } => source.to_string(),
        };
        FailureReport {
            kind: self.kind(),
            error,
            raw_response: self.raw_response().map(str::to_string),
        }
    }
}
