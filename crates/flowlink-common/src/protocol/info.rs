//! Service information record returned by the `/status` endpoint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured view of the service's `/status` document.
///
/// # Example
///
/// ```
/// use flowlink_common::protocol::ServiceInfo;
///
/// let info: ServiceInfo = serde_json::from_str(
///     r#"{"jina": {"jina": "3.20.0"}, "envs": {"JINA_LOG_LEVEL": "INFO"}}"#,
/// ).unwrap();
/// assert_eq!(info.service.get("jina").map(String::as_str), Some("3.20.0"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceInfo {
    /// Version and runtime details of the service itself
    #[serde(default, alias = "jina")]
    pub service: BTreeMap<String, String>,
    /// Environment the service was started with
    #[serde(default)]
    pub envs: BTreeMap<String, String>,
}

impl ServiceInfo {
    /// Looks up a key in the service section.
    pub fn version(&self, component: &str) -> Option<&str> {
        self.service.get(component).map(String::as_str)
    }
}
