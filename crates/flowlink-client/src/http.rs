//! HTTP transport
//!
//! Builds the `reqwest` client shared by the health-check, info and HTTP
//! post clients. Hostname resolution is routed through a [`Dialer`], so
//! outbound HTTP connections use the cached resolution and the randomized
//! candidate order; the connector then tries the candidates in that order.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::{Client, Response, StatusCode};

use flowlink_common::protocol::error::{FlowlinkError, Result};
use flowlink_common::transport::Dialer;

/// HTTP transport configuration.
///
/// # Default Configuration
///
/// - `connect_timeout`: 10 seconds per connection attempt
/// - `tls_handshake_timeout`: 20 seconds; the connector has no handshake
///   deadline of its own, so the handshake is bounded by
///   `response_header_timeout`
/// - `response_header_timeout`: 30 seconds
/// - `idle_timeout`: 300 seconds
/// - `max_idle_per_host`: 500
/// - `request_timeout`: 1 hour
///
/// Compression is always disabled and proxies are taken from the standard
/// `HTTP_PROXY` / `HTTPS_PROXY` / `NO_PROXY` environment variables.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub tls_handshake_timeout: Duration,
    pub response_header_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_idle_per_host: usize,
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            tls_handshake_timeout: Duration::from_secs(20),
            response_header_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(300),
            max_idle_per_host: 500,
            request_timeout: Duration::from_secs(60 * 60),
        }
    }
}

impl HttpConfig {
    pub fn with_response_header_timeout(mut self, timeout: Duration) -> Self {
        self.response_header_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Feeds the dialer's candidate order to the HTTP connector.
struct DialerResolver {
    dialer: Dialer,
}

impl Resolve for DialerResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let dialer = self.dialer.clone();
        Box::pin(async move {
            let order = dialer
                .candidates(name.as_str())
                .await
                .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
            // The connector fills in the port from the request URL.
            let addrs: Addrs = Box::new(order.into_iter().map(|ip| SocketAddr::new(ip, 0)));
            Ok(addrs)
        })
    }
}

/// Deadline for one pass over `candidates` addresses.
///
/// The connector divides its connect timeout evenly across the addresses it
/// is handed, so scaling by the candidate count leaves each attempt with the
/// configured per-attempt timeout.
pub(crate) fn connect_budget(per_attempt: Duration, candidates: usize) -> Duration {
    per_attempt.saturating_mul(candidates.max(1) as u32)
}

/// Shared HTTP client with the flowlink connection policy.
///
/// One `reqwest` client is built per distinct candidate count, so a host
/// resolving to `n` addresses gets a connect deadline of `n` times the
/// per-attempt timeout. Clones share those clients and their pools.
#[derive(Clone)]
pub struct HttpTransport {
    clients: Arc<Mutex<HashMap<usize, Client>>>,
    dialer: Dialer,
    config: HttpConfig,
}

impl HttpTransport {
    /// Creates a transport with the default configuration and the
    /// process-wide resolution cache.
    pub fn new() -> Result<Self> {
        Self::with_config(HttpConfig::default(), Dialer::new())
    }

    pub fn with_config(config: HttpConfig, dialer: Dialer) -> Result<Self> {
        let transport = Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
            dialer,
            config,
        };
        // Surface builder failures here rather than on the first request.
        transport.client(1)?;
        Ok(transport)
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Issues a GET and waits for the response headers.
    pub async fn get(&self, url: &str) -> Result<Response> {
        let client = self.client_for(url).await?;
        self.execute(client.get(url)).await
    }

    /// POSTs a JSON body and waits for the response headers.
    pub async fn post_json(&self, url: &str, body: String) -> Result<Response> {
        let client = self.client_for(url).await?;
        self.execute(
            client
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body),
        )
        .await
    }

    /// Picks the client whose connect deadline matches the number of
    /// addresses the URL's host resolves to.
    async fn client_for(&self, url: &str) -> Result<Client> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| FlowlinkError::Http(format!("invalid URL {}: {}", url, e)))?;
        let host = parsed.host_str().ok_or_else(|| {
            FlowlinkError::InvalidEndpoint(format!("'{}' does not name a host", url))
        })?;
        let literal = host.trim_start_matches('[').trim_end_matches(']');

        let candidates = if literal.parse::<IpAddr>().is_ok() {
            1
        } else {
            // Served again from the cache when the connector resolves.
            self.dialer.cache().fetch(host).await?.len()
        };
        self.client(candidates)
    }

    fn client(&self, candidates: usize) -> Result<Client> {
        let mut clients = self.clients.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(client) = clients.get(&candidates) {
            return Ok(client.clone());
        }

        let config = &self.config;
        let client = Client::builder()
            .dns_resolver(Arc::new(DialerResolver {
                dialer: self.dialer.clone(),
            }))
            .connect_timeout(connect_budget(config.connect_timeout, candidates))
            .pool_idle_timeout(config.idle_timeout)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .timeout(config.request_timeout)
            .no_gzip()
            .no_brotli()
            .no_deflate()
            .build()
            .map_err(|e| FlowlinkError::Http(format!("failed to build HTTP client: {}", e)))?;

        clients.insert(candidates, client.clone());
        Ok(client)
    }

    /// Sends the request and waits at most `response_header_timeout` for
    /// the response headers.
    ///
    /// The deadline starts when the request is issued, so connecting and the
    /// TLS handshake count against it, not just the wait after the request
    /// was written. The TLS handshake has no deadline of its own and is
    /// bounded by this one.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        let timeout = self.config.response_header_timeout;
        tokio::time::timeout(timeout, request.send())
            .await
            .map_err(|_| {
                FlowlinkError::Http(format!(
                    "no response headers within {}ms",
                    timeout.as_millis()
                ))
            })?
            .map_err(map_reqwest_error)
    }
}

/// Fails with [`FlowlinkError::Status`] unless the response is a 200.
pub(crate) fn ensure_ok(response: &Response) -> Result<()> {
    let status = response.status();
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(FlowlinkError::Status(status.as_u16()))
    }
}

pub(crate) async fn read_body(response: Response) -> Result<Vec<u8>> {
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    Ok(bytes.to_vec())
}

fn map_reqwest_error(err: reqwest::Error) -> FlowlinkError {
    if err.is_connect() {
        FlowlinkError::Http(format!("connection failed: {}", error_chain(&err)))
    } else if err.is_timeout() {
        FlowlinkError::Http(format!("request timed out: {}", err))
    } else {
        FlowlinkError::Http(error_chain(&err))
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
