//! One-shot JSON requests over HTTP and HTTPS.
//!
//! # Overview
//! A `RequestConfig` describes a request; `JsonRequest::new` validates it
//! and returns a reusable, preconfigured request. Each invocation opens one
//! connection, sends the body as JSON, buffers the whole response, and
//! settles exactly once with either a `JsonResponse` or a `RequestFailure`.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use req_json::{JsonRequest, RequestConfig};
//! use serde_json::json;
//!
//! let request = JsonRequest::new(
//!     RequestConfig::new("https://api.example.com/data")
//!         .method("POST")
//!         .body(json!({"key": "value"})),
//! )?;
//!
//! match request.send().await {
//!     Ok(response) => println!("{} {}", response.status, response.body),
//!     Err(failure) => eprintln!("{}: {failure}", failure.kind()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - Construction is synchronous and fallible (`ConfigError`); a malformed
//!   URL never reaches the error continuation.
//! - `send` returns a future; `invoke` spawns it and routes the outcome to
//!   one of two `FnOnce` callbacks.
//! - Non-2xx statuses are successful exchanges. The caller inspects
//!   `JsonResponse::status`.
//! - Failures are `RequestError`, `TimeoutError`, or `ParseError`.
//! - Transports are chosen by URL scheme from a `TransportTable`.

pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod transport;

pub use config::{RequestConfig, DEFAULT_METHOD, DEFAULT_TIMEOUT};
pub use error::{ConfigError, FailureKind, FailureReport, RequestFailure};
pub use executor::JsonRequest;
pub use http::{HeaderValue, JsonResponse};
pub use transport::{PlainTransport, SecureTransport, Transport, TransportTable};
