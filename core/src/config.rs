use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::error::ConfigError;

pub const DEFAULT_METHOD: &str = "GET";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Everything needed to describe one JSON request.
///
/// `new` seeds the defaults: `GET`, no extra headers, an empty object body,
/// and a 5 second timeout. A zero timeout disables the timer.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub url: String,
    pub method: String,
    /// Applied in order on top of `Content-Type: application/json`. Names
    /// compare case-insensitively, so later entries win.
    pub headers: Vec<(String, String)>,
    pub body: Value,
    pub timeout: Duration,
}

impl RequestConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: DEFAULT_METHOD.to_string(),
            headers: Vec::new(),
            body: Value::Object(Default::default()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Serialize any value into the body.
    pub fn json_body<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ConfigError> {
        self.body = serde_json::to_value(body)?;
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout_ms(self, millis: u64) -> Self {
        self.timeout(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn new_applies_defaults() {
        let config = RequestConfig::new("http://localhost:3000");
        assert_eq!(config.url, "http://localhost:3000");
        assert_eq!(config.method, "GET");
        assert!(config.headers.is_empty());
        assert_eq!(config.body, json!({}));
        assert_eq!(config.timeout, Duration::from_millis(5000));
    }

    #[test]
    fn builders_override_defaults() {
        let config = RequestConfig::new("https://api.example.com/data")
            .method("POST")
            .header("X-Test", "1")
            .body(json!({"key": "value"}))
            .timeout_ms(250);
        assert_eq!(config.method, "POST");
        assert_eq!(config.headers, vec![("X-Test".to_string(), "1".to_string())]);
        assert_eq!(config.body, json!({"key": "value"}));
        assert_eq!(config.timeout, Duration::from_millis(250));
    }

    #[test]
    fn json_body_accepts_serializable_values() {
        let mut payload = BTreeMap::new();
        payload.insert("title", "foo");
        let config = RequestConfig::new("http://localhost")
            .json_body(&payload)
            .unwrap();
        assert_eq!(config.body, json!({"title": "foo"}));
    }

    #[test]
    fn json_body_rejects_non_string_map_keys() {
        let mut payload = BTreeMap::new();
        payload.insert(vec![1u8], 1);
        let err = RequestConfig::new("http://localhost")
            .json_body(&payload)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Serialization(_)));
    }
}
