//! Scheme-keyed transports.
//!
//! # Design
//! A `Transport` executes one prepared `reqwest::Request` and hands back the
//! response head with its body still unread. `TransportTable` maps a URL
//! scheme to a transport and falls back to plaintext for anything it does
//! not know, leaving the transport itself to reject unsupported schemes.
//!
//! The standard transports never follow redirects, never use a proxy, and
//! keep no idle connections, so every exchange owns its socket and closes it
//! when the response or the in-flight future is dropped.
//!
//! Besides `host` and the assembled request headers, the only header that
//! reaches the wire is reqwest's `accept: */*`, added when the caller sets
//! no `Accept` of their own.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use reqwest::{redirect, Certificate, Client, ClientBuilder};

use crate::error::ConfigError;

#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, reqwest::Error>;
}

fn one_shot_client() -> ClientBuilder {
    Client::builder()
        .redirect(redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
}

/// Plain TCP transport for `http` URLs.
#[derive(Debug, Clone)]
pub struct PlainTransport {
    client: Client,
}

impl PlainTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: one_shot_client().build()?,
        })
    }
}

#[async_trait]
impl Transport for PlainTransport {
    fn name(&self) -> &'static str {
        "plain"
    }

    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, reqwest::Error> {
        self.client.execute(request).await
    }
}

/// rustls transport for `https` URLs. Refuses anything that is not TLS.
#[derive(Debug, Clone)]
pub struct SecureTransport {
    client: Client,
}

impl SecureTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Self::builder().build()?,
        })
    }

    /// Also trust `pem`, on top of the bundled web roots. For private CAs
    /// and self-signed servers.
    pub fn with_root_certificate(pem: &[u8]) -> Result<Self, reqwest::Error> {
        let cert = Certificate::from_pem(pem)?;
        Ok(Self {
            client: Self::builder().add_root_certificate(cert).build()?,
        })
    }

    fn builder() -> ClientBuilder {
        one_shot_client().use_rustls_tls().https_only(true)
    }
}

#[async_trait]
impl Transport for SecureTransport {
    fn name(&self) -> &'static str {
        "secure"
    }

    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, reqwest::Error> {
        self.client.execute(request).await
    }
}

#[derive(Debug, Clone)]
pub struct TransportTable {
    by_scheme: HashMap<String, Arc<dyn Transport>>,
    fallback: Arc<dyn Transport>,
}

impl TransportTable {
    /// An empty table that sends every scheme to `fallback`.
    pub fn new(fallback: Arc<dyn Transport>) -> Self {
        Self {
            by_scheme: HashMap::new(),
            fallback,
        }
    }

    /// `http` to `PlainTransport`, `https` to `SecureTransport`.
    pub fn standard() -> Result<Self, reqwest::Error> {
        let plain: Arc<dyn Transport> = Arc::new(PlainTransport::new()?);
        let secure: Arc<dyn Transport> = Arc::new(SecureTransport::new()?);
        Ok(Self::new(plain.clone())
            .register("http", plain)
            .register("https", secure))
    }

    pub fn register(mut self, scheme: &str, transport: Arc<dyn Transport>) -> Self {
        self.by_scheme.insert(scheme.to_ascii_lowercase(), transport);
        self
    }

    pub fn select(&self, scheme: &str) -> Arc<dyn Transport> {
        self.by_scheme
            .get(scheme)
            .unwrap_or(&self.fallback)
            .clone()
    }
}

static STANDARD: OnceCell<TransportTable> = OnceCell::new();

/// The process-wide standard table, built on first use.
pub fn standard_transports() -> Result<&'static TransportTable, ConfigError> {
    STANDARD.get_or_try_init(|| TransportTable::standard().map_err(ConfigError::Transport))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_selects_by_scheme() {
        let table = standard_transports().unwrap();
        assert_eq!(table.select("http").name(), "plain");
        assert_eq!(table.select("https").name(), "secure");
    }

    #[test]
    fn unknown_scheme_falls_back_to_plain() {
        let table = standard_transports().unwrap();
        assert_eq!(table.select("ftp").name(), "plain");
        assert_eq!(table.select("ws").name(), "plain");
    }

    #[test]
    fn registered_transport_overrides_standard_entry() {
        let secure: Arc<dyn Transport> = Arc::new(SecureTransport::new().unwrap());
        let table = TransportTable::standard().unwrap().register("HTTP", secure);
        assert_eq!(table.select("http").name(), "secure");
    }
}
