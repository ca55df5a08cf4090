//! Flowlink Transport Layer
//!
//! Everything the clients need below the payload: the JSON codec, endpoint
//! normalization, and the resilient dialer with its resolution cache.
//!
//! # Components
//!
//! - **[`JsonCodec`]**: encode payloads to text frames and decode responses
//! - **[`endpoint`]**: host/URL normalization and `host:port` splitting
//! - **[`ResolverCache`]** / **[`Resolve`]**: TTL cache of hostname lookups
//! - **[`Dialer`]**: TCP connection factory with randomized failover
//!
//! # Example
//!
//! ```no_run
//! use flowlink_common::transport::{Dialer, DialerConfig};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dialer = Dialer::new()
//!     .with_config(DialerConfig::default().with_connect_timeout(Duration::from_secs(3)));
//! let stream = dialer.dial("svc.example.com:8080").await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod dialer;
pub mod endpoint;
pub mod resolver;

pub use codec::JsonCodec;
pub use dialer::{select_order, Dialer, DialerConfig, StartPicker, DEFAULT_CONNECT_TIMEOUT};
pub use resolver::{
    Resolve, ResolverCache, SystemResolver, DEFAULT_CACHE_TTL, DEFAULT_LOOKUP_TIMEOUT,
};
