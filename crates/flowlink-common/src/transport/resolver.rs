//! Hostname Resolution Cache
//!
//! Dialing resolves the host portion of an address through a [`ResolverCache`]
//! so that repeated connections to the same service do not hit DNS every time.
//! Entries live for a fixed TTL and are refreshed lazily on the first lookup
//! after they expire.
//!
//! # Architecture
//!
//! - **[`Resolve`]**: the lookup backend, injectable so tests can supply
//!   deterministic addresses instead of real DNS
//! - **[`SystemResolver`]**: the default backend, using tokio's resolver
//! - **[`ResolverCache`]**: TTL cache in front of a backend; one process-wide
//!   instance is available through [`ResolverCache::global`]
//!
//! # Example
//!
//! ```no_run
//! use flowlink_common::transport::ResolverCache;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = ResolverCache::new(Duration::from_secs(60));
//! let addrs = cache.fetch("localhost").await?;
//! assert!(!addrs.is_empty());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::protocol::error::{FlowlinkError, Result};

/// Default lifetime of a cached resolution (1 minute)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Default upper bound on a single lookup (10 seconds)
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

static GLOBAL_CACHE: OnceLock<Arc<ResolverCache>> = OnceLock::new();

/// A hostname lookup backend.
pub trait Resolve: Send + Sync {
    /// Resolve `host` to its addresses, in the order the backend returns them.
    fn resolve(&self, host: &str) -> BoxFuture<'static, io::Result<Vec<IpAddr>>>;
}

/// Resolves hostnames with the operating system resolver.
///
/// IP literals are returned as-is without a lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolve for SystemResolver {
    fn resolve(&self, host: &str) -> BoxFuture<'static, io::Result<Vec<IpAddr>>> {
        let host = host.to_string();
        Box::pin(async move {
            if let Ok(ip) = host.parse::<IpAddr>() {
                return Ok(vec![ip]);
            }

            let mut ips = Vec::new();
            for addr in tokio::net::lookup_host((host.as_str(), 0)).await? {
                if !ips.contains(&addr.ip()) {
                    ips.push(addr.ip());
                }
            }
            Ok(ips)
        })
    }
}

struct CacheEntry {
    addrs: Vec<IpAddr>,
    expires_at: Instant,
}

/// TTL cache of hostname resolutions.
///
/// Safe to share between tasks. Two tasks refreshing the same expired entry
/// at once both resolve, and the later write wins.
pub struct ResolverCache {
    resolver: Arc<dyn Resolve>,
    ttl: Duration,
    lookup_timeout: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResolverCache {
    /// Creates a cache backed by the system resolver.
    pub fn new(ttl: Duration) -> Self {
        Self::with_resolver(Arc::new(SystemResolver), ttl)
    }

    /// Creates a cache backed by a custom resolver.
    pub fn with_resolver(resolver: Arc<dyn Resolve>, ttl: Duration) -> Self {
        Self {
            resolver,
            ttl,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Sets the upper bound on a single lookup.
    pub fn with_lookup_timeout(mut self, lookup_timeout: Duration) -> Self {
        self.lookup_timeout = lookup_timeout;
        self
    }

    /// The process-wide cache shared by every default [`Dialer`](super::Dialer).
    pub fn global() -> Arc<ResolverCache> {
        GLOBAL_CACHE
            .get_or_init(|| Arc::new(ResolverCache::new(DEFAULT_CACHE_TTL)))
            .clone()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the addresses for `host`, resolving when the entry is missing
    /// or expired.
    ///
    /// # Errors
    ///
    /// - [`FlowlinkError::Resolution`] if the lookup fails or exceeds the
    ///   lookup timeout
    /// - [`FlowlinkError::NoSuchHost`] if the lookup returns no addresses
    pub async fn fetch(&self, host: &str) -> Result<Vec<IpAddr>> {
        if let Some(addrs) = self.cached(host).await {
            return Ok(addrs);
        }

        let lookup = tokio::time::timeout(self.lookup_timeout, self.resolver.resolve(host)).await;
        let addrs = match lookup {
            Ok(Ok(addrs)) => addrs,
            Ok(Err(source)) => {
                return Err(FlowlinkError::Resolution {
                    host: host.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(FlowlinkError::Resolution {
                    host: host.to_string(),
                    source: io::Error::new(io::ErrorKind::TimedOut, "lookup timed out"),
                })
            }
        };

        if addrs.is_empty() {
            return Err(FlowlinkError::NoSuchHost(host.to_string()));
        }

        debug!(host, count = addrs.len(), "refreshed resolution cache");
        self.entries.write().await.insert(
            host.to_string(),
            CacheEntry {
                addrs: addrs.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(addrs)
    }

    async fn cached(&self, host: &str) -> Option<Vec<IpAddr>> {
        let entries = self.entries.read().await;
        entries
            .get(host)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.addrs.clone())
    }

    /// Drops the entry for `host`. Returns whether one was present.
    pub async fn invalidate(&self, host: &str) -> bool {
        self.entries.write().await.remove(host).is_some()
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of entries, including expired ones not yet refreshed.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed answer and counts lookups.
    struct CountingResolver {
        answer: Vec<IpAddr>,
        lookups: AtomicUsize,
    }

    impl CountingResolver {
        fn new(answer: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                answer: answer.iter().map(|ip| ip.parse().unwrap()).collect(),
                lookups: AtomicUsize::new(0),
            })
        }
    }

    impl Resolve for CountingResolver {
        fn resolve(&self, _host: &str) -> BoxFuture<'static, io::Result<Vec<IpAddr>>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            let answer = self.answer.clone();
            Box::pin(async move { Ok(answer) })
        }
    }

    struct FailingResolver;

    impl Resolve for FailingResolver {
        fn resolve(&self, _host: &str) -> BoxFuture<'static, io::Result<Vec<IpAddr>>> {
            Box::pin(async { Err(io::Error::new(io::ErrorKind::Other, "SERVFAIL")) })
        }
    }

    struct HangingResolver;

    impl Resolve for HangingResolver {
        fn resolve(&self, _host: &str) -> BoxFuture<'static, io::Result<Vec<IpAddr>>> {
            Box::pin(futures::future::pending())
        }
    }

    #[tokio::test]
    async fn test_fetch_caches_within_ttl() {
        let resolver = CountingResolver::new(&["10.0.0.1", "10.0.0.2"]);
        let cache = ResolverCache::with_resolver(resolver.clone(), Duration::from_secs(60));

        let first = cache.fetch("svc.example.com").await.unwrap();
        let second = cache.fetch("svc.example.com").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(resolver.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_refreshes_after_expiry() {
        let resolver = CountingResolver::new(&["10.0.0.1"]);
        let cache = ResolverCache::with_resolver(resolver.clone(), Duration::from_secs(60));

        cache.fetch("svc").await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        cache.fetch("svc").await.unwrap();

        assert_eq!(resolver.lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_answer_is_no_such_host() {
        let resolver = CountingResolver::new(&[]);
        let cache = ResolverCache::with_resolver(resolver, DEFAULT_CACHE_TTL);

        let err = cache.fetch("ghost").await.unwrap_err();
        assert!(matches!(err, FlowlinkError::NoSuchHost(ref host) if host == "ghost"));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_resolution_error() {
        let cache = ResolverCache::with_resolver(Arc::new(FailingResolver), DEFAULT_CACHE_TTL);
        let err = cache.fetch("svc").await.unwrap_err();
        assert!(matches!(err, FlowlinkError::Resolution { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_timeout_bounds_fetch() {
        let cache = ResolverCache::with_resolver(Arc::new(HangingResolver), DEFAULT_CACHE_TTL)
            .with_lookup_timeout(Duration::from_secs(2));
        let err = cache.fetch("svc").await.unwrap_err();
        assert_eq!(err.io_kind(), Some(io::ErrorKind::TimedOut));
    }

    #[tokio::test]
    async fn test_invalidate_forces_lookup() {
        let resolver = CountingResolver::new(&["10.0.0.1"]);
        let cache = ResolverCache::with_resolver(resolver.clone(), DEFAULT_CACHE_TTL);

        cache.fetch("svc").await.unwrap();
        assert!(cache.invalidate("svc").await);
        assert!(!cache.invalidate("svc").await);
        cache.fetch("svc").await.unwrap();

        assert_eq!(resolver.lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = ResolverCache::with_resolver(CountingResolver::new(&["10.0.0.1"]), DEFAULT_CACHE_TTL);
        cache.fetch("a").await.unwrap();
        cache.fetch("b").await.unwrap();
        assert_eq!(cache.len().await, 2);
        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_system_resolver_ip_literal() {
        let ips = SystemResolver.resolve("127.0.0.1").await.unwrap();
        assert_eq!(ips, vec!["127.0.0.1".parse::<IpAddr>().unwrap()]);
    }

    #[test]
    fn test_global_cache_is_shared() {
        let a = ResolverCache::global();
        let b = ResolverCache::global();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.ttl(), DEFAULT_CACHE_TTL);
    }
}
