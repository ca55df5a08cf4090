//! Resilient Dialer
//!
//! Connects to a `host:port` address whose host may resolve to several
//! replica addresses. The host is resolved through a shared
//! [`ResolverCache`], the candidate list is rotated from a random starting
//! index so load spreads across replicas, and each candidate is tried once
//! until one accepts the connection.

use std::future::Future;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::net::TcpStream;
use tracing::debug;

use super::endpoint::{join_host_port, split_host_port};
use super::resolver::ResolverCache;
use crate::protocol::error::{FlowlinkError, Result};

/// Default timeout for a single connection attempt (10 seconds)
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Picks the starting index into a candidate list of the given length.
pub type StartPicker = Arc<dyn Fn(usize) -> usize + Send + Sync>;

/// Dialer configuration.
#[derive(Debug, Clone)]
pub struct DialerConfig {
    /// Timeout for each connection attempt
    pub connect_timeout: Duration,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl DialerConfig {
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

/// Orders `candidates` starting at `start`, wrapping around once.
///
/// Every candidate appears exactly once. `start` is taken modulo the
/// number of candidates.
///
/// ```
/// use flowlink_common::transport::select_order;
/// use std::net::IpAddr;
///
/// let ips: Vec<IpAddr> = vec!["10.0.0.1".parse().unwrap(), "10.0.0.2".parse().unwrap()];
/// assert_eq!(select_order(&ips, 1), vec![ips[1], ips[0]]);
/// ```
pub fn select_order(candidates: &[IpAddr], start: usize) -> Vec<IpAddr> {
    let n = candidates.len();
    if n == 0 {
        return Vec::new();
    }
    let start = start % n;
    (0..n).map(|i| candidates[(start + i) % n]).collect()
}

fn random_start(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    rand::rng().random_range(0..n)
}

/// Connection factory with cached resolution and randomized failover.
///
/// # Example
///
/// ```no_run
/// use flowlink_common::transport::Dialer;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dialer = Dialer::new();
/// let stream = dialer.dial("svc.example.com:8080").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Dialer {
    cache: Arc<ResolverCache>,
    config: DialerConfig,
    pick_start: StartPicker,
}

impl Default for Dialer {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialer {
    /// Creates a dialer using the process-wide resolution cache.
    pub fn new() -> Self {
        Self::with_cache(ResolverCache::global())
    }

    /// Creates a dialer using its own resolution cache.
    pub fn with_cache(cache: Arc<ResolverCache>) -> Self {
        Self {
            cache,
            config: DialerConfig::default(),
            pick_start: Arc::new(random_start),
        }
    }

    pub fn with_config(mut self, config: DialerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the uniform random choice of the first candidate.
    pub fn with_start_picker<F>(mut self, pick_start: F) -> Self
    where
        F: Fn(usize) -> usize + Send + Sync + 'static,
    {
        self.pick_start = Arc::new(pick_start);
        self
    }

    pub fn cache(&self) -> &Arc<ResolverCache> {
        &self.cache
    }

    pub fn config(&self) -> &DialerConfig {
        &self.config
    }

    /// Resolves `host` and returns its addresses in the order they will be tried.
    pub async fn candidates(&self, host: &str) -> Result<Vec<IpAddr>> {
        let ips = self.cache.fetch(host).await?;
        let start = (self.pick_start)(ips.len());
        Ok(select_order(&ips, start))
    }

    /// Opens a TCP connection to `address`.
    ///
    /// # Errors
    ///
    /// - [`FlowlinkError::Resolution`] / [`FlowlinkError::NoSuchHost`] if the
    ///   host cannot be resolved; no connection is attempted
    /// - [`FlowlinkError::Connect`] carrying the last candidate's error when
    ///   every candidate fails
    pub async fn dial(&self, address: &str) -> Result<TcpStream> {
        let connect_timeout = self.config.connect_timeout;
        self.dial_with(address, move |target| async move {
            match tokio::time::timeout(connect_timeout, TcpStream::connect(target.as_str())).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect timed out after {}ms", connect_timeout.as_millis()),
                )),
            }
        })
        .await
    }

    /// Runs the dial loop with a caller-supplied connect function.
    ///
    /// `connect` receives each candidate as an `ip:port` string (just the
    /// ip when `address` has no port) and is called at most once per
    /// candidate.
    pub async fn dial_with<C, F, Fut>(&self, address: &str, mut connect: F) -> Result<C>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = io::Result<C>>,
    {
        let (host, port) = split_host_port(address);
        let order = self.candidates(host).await?;

        let mut last_err = None;
        for ip in order {
            let target = join_host_port(ip, port);
            debug!(address, target = %target, "dialing candidate");
            match connect(target.clone()).await {
                Ok(conn) => return Ok(conn),
                Err(source) => {
                    debug!(target = %target, error = %source, "candidate failed");
                    last_err = Some(FlowlinkError::Connect {
                        addr: target,
                        source,
                    });
                }
            }
        }

        Err(last_err.unwrap_or_else(|| FlowlinkError::NoSuchHost(host.to_string())))
    }
}
