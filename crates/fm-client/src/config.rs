//! Transport settings for talking to a FileMaker Server.

use std::time::Duration;

/// How the HTTP transport reaches the Data API.
///
/// Timeouts live here rather than in the dispatcher: an aborted exchange
/// surfaces as a transport error like any other.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound on one full exchange, headers and body included.
    pub timeout: Duration,
    /// Upper bound on the TCP and TLS handshake alone.
    pub connect_timeout: Duration,
    /// How long a kept-alive connection to the server may sit unused.
    /// Shorter than the server's own 15 minute session idle limit.
    pub idle_connection_timeout: Duration,
    /// Kept-alive connections per server.
    pub max_idle_connections: usize,
    /// Sent as `User-Agent`; shows up in the server's access log.
    pub user_agent: String,
    /// Ask for gzip/deflate bodies. Found sets compress well.
    pub accept_compressed: bool,
    /// Log each exchange at debug level (URLs with session tokens redacted).
    pub enable_tracing: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            idle_connection_timeout: Duration::from_secs(90),
            max_idle_connections: 10,
            user_agent: crate::USER_AGENT.to_string(),
            accept_compressed: true,
            enable_tracing: true,
        }
    }
}

impl ClientConfig {
    /// Start from the defaults and override selectively.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Fluent overrides on top of [`ClientConfig::default`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Bound each exchange; an overrun is reported as a timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Keep at most `max` idle connections, each for at most `timeout`.
    ///
    /// `max = 0` opens a fresh connection per call.
    pub fn with_idle_connections(mut self, max: usize, timeout: Duration) -> Self {
        self.config.max_idle_connections = max;
        self.config.idle_connection_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.config.accept_compressed = enabled;
        self
    }

    /// Silence per-exchange debug logs, e.g. for chatty batch jobs.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.config.enable_tracing = enabled;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
