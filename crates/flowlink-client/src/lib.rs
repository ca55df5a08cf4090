//! Flowlink clients
//!
//! - [`StreamingClient`]: persistent WebSocket session with concurrent send
//!   and receive, matched by arrival order
//! - [`HttpClient`]: one POST per request over the shared [`HttpTransport`]
//! - [`HealthCheckClient`] / [`InfoClient`]: single-call status probes
//!
//! Per-request outcomes are reported through a [`RequestObserver`].

pub mod client;
pub mod health;
pub mod http;
pub mod info;
pub mod observer;
pub mod pending;
pub mod streaming;

pub use client::HttpClient;
pub use health::HealthCheckClient;
pub use http::{HttpConfig, HttpTransport};
pub use info::InfoClient;
pub use observer::{Callbacks, NoopObserver, RequestObserver};
pub use pending::PendingRequests;
pub use streaming::StreamingClient;
