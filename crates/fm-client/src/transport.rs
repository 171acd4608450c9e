//! The transport seam: one HTTP request in, one response (or network error) out.

use std::future::Future;

use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::HttpRequest;
use crate::response::HttpResponse;

/// Executes a single HTTP exchange.
///
/// Implementations must not interpret status codes: any response that
/// arrives, 2xx or not, is returned as `Ok`. Only failures where no
/// response exists (connect, DNS, TLS, timeout) are errors.
pub trait Transport: Send + Sync + 'static {
    /// Send one request.
    fn send(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse>> + Send;
}

/// reqwest-backed transport with connection pooling.
///
/// Clone is cheap: the inner client is reference counted.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    inner: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Create a transport from configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.idle_connection_timeout)
            .pool_max_idle_per_host(config.max_idle_connections)
            .user_agent(&config.user_agent)
            .gzip(config.accept_compressed)
            .deflate(config.accept_compressed);

        let inner = builder
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self { inner, config })
    }

    /// Create a transport with default configuration.
    pub fn default_transport() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Get the transport configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut req = self
            .inner
            .request(request.method.to_reqwest(), &request.url);

        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if self.config.enable_tracing {
            debug!(method = %request.method, url = %request.redacted_url(), "Sending request");
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        let response = req.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        if self.config.enable_tracing {
            if (200..300).contains(&status) {
                debug!(status, bytes = body.len(), "Response received");
            } else {
                info!(status, bytes = body.len(), "Non-success response");
            }
        }

        Ok(HttpResponse { status, body })
    }
}
