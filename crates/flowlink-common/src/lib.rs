//! Flowlink Common Types and Transport
//!
//! This crate provides the payload types, error taxonomy and connection
//! plumbing shared by the flowlink clients.
//!
//! # Overview
//!
//! Flowlink talks to a remote compute service either over HTTP or over a
//! persistent WebSocket connection. This crate holds the pieces both paths
//! share:
//!
//! - **Protocol Layer**: the request payload, the service info record and
//!   [`FlowlinkError`]
//! - **Transport Layer**: JSON codec, endpoint normalization, the resolution
//!   cache and the resilient dialer
//!
//! # Components
//!
//! - [`protocol`] - Payload types and errors
//! - [`transport`] - Codec, endpoints, resolver cache and dialer
//!
//! # Example
//!
//! ```
//! use flowlink_common::{DataRequest, JsonCodec};
//! use serde_json::json;
//!
//! let request = DataRequest::new(json!([{"text": "hello"}]));
//! let frame = JsonCodec::encode(&request).unwrap();
//! assert!(frame.starts_with('{'));
//! ```

pub mod protocol;
pub mod transport;

pub use protocol::*;
pub use transport::{Dialer, DialerConfig, JsonCodec, ResolverCache};
