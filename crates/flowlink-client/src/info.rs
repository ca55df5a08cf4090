use flowlink_common::protocol::error::Result;
use flowlink_common::protocol::ServiceInfo;
use flowlink_common::transport::endpoint::http_url;
use flowlink_common::transport::JsonCodec;

use crate::http::{ensure_ok, read_body, HttpTransport};

/// Fetches the service's `/status` document.
pub struct InfoClient {
    base_url: String,
    transport: HttpTransport,
}

impl InfoClient {
    pub fn new(host: &str) -> Result<Self> {
        Self::with_transport(host, HttpTransport::new()?)
    }

    pub fn with_transport(host: &str, transport: HttpTransport) -> Result<Self> {
        Ok(Self {
            base_url: http_url(host)?,
            transport,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The `/status` document, pretty-printed with two-space indentation.
    pub async fn info_json(&self) -> Result<String> {
        let response = self.transport.get(&format!("{}/status", self.base_url)).await?;
        ensure_ok(&response)?;
        let body = read_body(response).await?;
        JsonCodec::pretty(&body)
    }

    /// The `/status` document as a [`ServiceInfo`] record.
    pub async fn info(&self) -> Result<ServiceInfo> {
        let body = self.info_json().await?;
        JsonCodec::decode(body.as_bytes())
    }
}
