//! Flowlink Request Payload
//!
//! The service exchanges one JSON document per request and per response.
//! The client never inspects the payload beyond serializing it, so the
//! default payload type keeps every member it does not know about.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One unit of work sent to (and echoed back by) the compute service.
///
/// Requests carry no correlation field the client relies on: responses are
/// matched to requests by arrival order only.
///
/// # Example
///
/// ```
/// use flowlink_common::protocol::DataRequest;
/// use serde_json::json;
///
/// let request = DataRequest::new(json!([{"text": "hello"}]))
///     .with_parameters(json!({"limit": 3}));
/// assert_eq!(request.parameters, Some(json!({"limit": 3})));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DataRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Value>,
    /// Members not modelled above, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DataRequest {
    pub fn new(data: Value) -> Self {
        DataRequest {
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn with_header(mut self, header: Value) -> Self {
        self.header = Some(header);
        self
    }

    /// The `header.request_id` member, when the service set one.
    pub fn request_id(&self) -> Option<&str> {
        self.header.as_ref()?.get("request_id")?.as_str()
    }
}
