use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::protocol::error::{FlowlinkError, Result};

/// JSON codec for payloads exchanged with the service.
///
/// Every message on the streaming connection is a single text frame holding
/// the JSON serialization of one payload, so encoding produces a `String`.
///
/// # Example
///
/// ```
/// use flowlink_common::transport::JsonCodec;
/// use flowlink_common::protocol::DataRequest;
/// use serde_json::json;
///
/// let request = DataRequest::new(json!({"n": 42}));
/// let frame = JsonCodec::encode(&request).unwrap();
/// let decoded: DataRequest = JsonCodec::decode(frame.as_bytes()).unwrap();
/// assert_eq!(decoded, request);
/// ```
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a payload as a text frame body.
    ///
    /// Failures surface as [`FlowlinkError::Serialization`].
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
        Ok(serde_json::to_string(value)?)
    }

    /// Decode an inbound frame body.
    ///
    /// Failures surface as [`FlowlinkError::Decode`] so callers can tell a
    /// malformed response apart from a request that could not be encoded.
    pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
        serde_json::from_slice(data).map_err(FlowlinkError::Decode)
    }

    /// Re-indent a JSON document with two spaces, keeping member order.
    pub fn pretty(data: &[u8]) -> Result<String> {
        let value: serde_json::Value = Self::decode(data)?;
        Ok(serde_json::to_string_pretty(&value)?)
    }
}
