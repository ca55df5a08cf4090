//! Endpoint normalization
//!
//! Callers name the service with a loose `host[:port]` string, optionally
//! prefixed with a `ws`, `wss`, `http` or `https` scheme. The helpers here
//! turn that into the URL each transport expects, and split dial addresses
//! into their host and port parts.

use std::net::IpAddr;

use crate::protocol::error::{FlowlinkError, Result};

/// Split `address` into host and port at the last colon.
///
/// The port is `None` when it is missing or empty. Bracketed IPv6 hosts are
/// unwrapped, and an unbracketed IPv6 literal is treated as a bare host.
///
/// ```
/// use flowlink_common::transport::endpoint::split_host_port;
///
/// assert_eq!(split_host_port("svc.example.com:8080"), ("svc.example.com", Some("8080")));
/// assert_eq!(split_host_port("svc.example.com"), ("svc.example.com", None));
/// assert_eq!(split_host_port("[::1]:80"), ("::1", Some("80")));
/// ```
pub fn split_host_port(address: &str) -> (&str, Option<&str>) {
    let (host, port) = if let Some(rest) = address.strip_prefix('[') {
        match rest.find(']') {
            Some(end) => {
                let port = rest[end + 1..].strip_prefix(':').unwrap_or("");
                (&rest[..end], port)
            }
            None => (address, ""),
        }
    } else if address.matches(':').count() > 1 {
        (address, "")
    } else {
        match address.rfind(':') {
            Some(idx) => (&address[..idx], &address[idx + 1..]),
            None => (address, ""),
        }
    };

    let port = if port.is_empty() { None } else { Some(port) };
    (host, port)
}

/// Join a resolved IP with an optional port into a dialable address.
pub fn join_host_port(ip: IpAddr, port: Option<&str>) -> String {
    match (ip, port) {
        (IpAddr::V6(v6), Some(port)) => format!("[{}]:{}", v6, port),
        (IpAddr::V4(v4), Some(port)) => format!("{}:{}", v4, port),
        (ip, None) => ip.to_string(),
    }
}

/// Normalize a host into a WebSocket URL.
///
/// ```
/// use flowlink_common::transport::endpoint::websocket_url;
///
/// assert_eq!(websocket_url("localhost:12345").unwrap(), "ws://localhost:12345");
/// assert_eq!(websocket_url("https://svc.example.com").unwrap(), "wss://svc.example.com");
/// ```
pub fn websocket_url(host: &str) -> Result<String> {
    let host = host.trim();
    let url = if host.starts_with("ws://") || host.starts_with("wss://") {
        host.to_string()
    } else if let Some(rest) = host.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = host.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        format!("ws://{}", host)
    };
    ensure_authority(host, url)
}

/// Normalize a host into an HTTP base URL without a trailing slash.
///
/// ```
/// use flowlink_common::transport::endpoint::http_url;
///
/// assert_eq!(http_url("ws://localhost:12345/").unwrap(), "http://localhost:12345");
/// assert_eq!(http_url("wss://svc.example.com").unwrap(), "https://svc.example.com");
/// ```
pub fn http_url(host: &str) -> Result<String> {
    let host = host.trim();
    let url = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else if let Some(rest) = host.strip_prefix("wss://") {
        format!("https://{}", rest)
    } else if let Some(rest) = host.strip_prefix("ws://") {
        format!("http://{}", rest)
    } else {
        format!("http://{}", host)
    };
    ensure_authority(host, url.trim_end_matches('/').to_string())
}

fn ensure_authority(original: &str, url: String) -> Result<String> {
    let authority = url
        .split_once("://")
        .map(|(_, rest)| rest.split('/').next().unwrap_or(""))
        .unwrap_or("");
    if authority.is_empty() {
        return Err(FlowlinkError::InvalidEndpoint(format!(
            "'{}' does not name a host",
            original
        )));
    }
    Ok(url)
}
