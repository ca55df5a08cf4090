use tracing::debug;

use flowlink_common::protocol::error::Result;
use flowlink_common::transport::endpoint::http_url;

use crate::http::{ensure_ok, HttpTransport};

/// Checks whether the service answers on its root URL.
///
/// The host is normalized to plain HTTP (`ws://` becomes `http://`, a bare
/// host gets `http://`). A 200 means healthy; any other status or a
/// transport failure means unhealthy.
pub struct HealthCheckClient {
    base_url: String,
    transport: HttpTransport,
}

impl HealthCheckClient {
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

    /// Fails with [`FlowlinkError::Status`](flowlink_common::FlowlinkError::Status)
    /// carrying the status code when the service answers with anything but 200.
    pub async fn health_check(&self) -> Result<()> {
        let response = self.transport.get(&format!("{}/", self.base_url)).await?;
        ensure_ok(&response)
    }

    pub async fn is_healthy(&self) -> bool {
        match self.health_check().await {
            Ok(()) => true,
            Err(e) => {
                debug!(url = %self.base_url, error = %e, "health check failed");
                false
            }
        }
    }
}
