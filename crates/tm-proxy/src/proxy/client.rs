//! Upstream fetching.
//!
//! The handler only sees the [`UpstreamFetch`] trait; [`HyperFetcher`] is the
//! production implementation on top of a pooled hyper-util client.

use crate::config::ConnectionPoolConfig;
use crate::error::ProxyError;
use async_trait::async_trait;
use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::header::HeaderName;
use hyper::{HeaderMap, Method, Request, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Type alias for the HTTP client used by the proxy.
pub type HttpClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, Empty<Bytes>>;

/// A fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamResponse {
    /// First value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Fetches one upstream URI with a plain GET.
#[async_trait]
pub trait UpstreamFetch: Send + Sync {
    async fn fetch(&self, uri: Uri) -> Result<UpstreamResponse, ProxyError>;
}

/// Create a shared HTTP client with connection pooling.
///
/// Redirects are never followed; the handler rewrites them for the client.
pub fn create_http_client(pool: &ConnectionPoolConfig) -> HttpClient {
    // Both ring and aws-lc-rs end up compiled in; pin the process default.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut http_connector = HttpConnector::new();
    http_connector.set_keepalive(Some(Duration::from_secs(pool.keepalive_timeout_secs)));
    http_connector.set_connect_timeout(Some(Duration::from_secs(pool.connect_timeout_secs)));
    http_connector.enforce_http(false); // Allow both HTTP and HTTPS

    let builder = match hyper_rustls::HttpsConnectorBuilder::new().with_native_roots() {
        Ok(builder) => builder,
        Err(e) => {
            warn!("Native root certificates unavailable ({e}), using bundled webpki roots");
            hyper_rustls::HttpsConnectorBuilder::new().with_webpki_roots()
        }
    };
    let https_connector = builder
        .https_or_http()
        .enable_http1()
        .wrap_connector(http_connector);

    let http_client = Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(pool.idle_timeout_secs))
        .pool_max_idle_per_host(pool.max_idle_per_host)
        .build(https_connector);

    info!(
        "Connection pool configured (HTTP/1.1): max_idle={}, idle_timeout={}s, keepalive={}s",
        pool.max_idle_per_host, pool.idle_timeout_secs, pool.keepalive_timeout_secs
    );

    http_client
}

/// [`UpstreamFetch`] over the shared pooled client, bounded by a per-request timeout.
pub struct HyperFetcher {
    client: HttpClient,
    timeout: Duration,
}

impl HyperFetcher {
    pub fn new(client: HttpClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn exchange(&self, uri: Uri) -> Result<UpstreamResponse, ProxyError> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Empty::new())
            .map_err(|e| ProxyError::InvalidTarget(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| ProxyError::Upstream(error_chain(&e)))?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| ProxyError::BodyRead(error_chain(&e)))?
            .to_bytes();

        Ok(UpstreamResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }
}

#[async_trait]
impl UpstreamFetch for HyperFetcher {
    async fn fetch(&self, uri: Uri) -> Result<UpstreamResponse, ProxyError> {
        debug!("Fetching upstream: {}", uri);
        let label = uri.to_string();
        match tokio::time::timeout(self.timeout, self.exchange(uri)).await {
            Ok(result) => result,
            Err(_) => Err(ProxyError::Interrupted(format!(
                "request to {label} timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

/// Render an error with its sources, `outer: inner: root`.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
