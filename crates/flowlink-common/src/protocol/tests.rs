//! Tests for the protocol module
//!
//! These tests verify payload serialization and error formatting.

#[cfg(test)]
mod tests {
    use super::super::*;
    use serde_json::json;

    #[test]
    fn test_data_request_creation() {
        let req = DataRequest::new(json!([{"text": "hi"}]));
        assert_eq!(req.data, Some(json!([{"text": "hi"}])));
        assert!(req.header.is_none());
        assert!(req.parameters.is_none());
        assert!(req.routes.is_empty());
    }

    #[test]
    fn test_data_request_omits_empty_members() {
        let req = DataRequest::new(json!(1));
        let encoded = serde_json::to_value(&req).unwrap();
        assert_eq!(encoded, json!({"data": 1}));
    }

    #[test]
    fn test_data_request_keeps_unknown_members() {
        let raw = json!({
            "header": {"request_id": "abc", "exec_endpoint": "/search"},
            "data": [],
            "routes": [{"executor": "gateway"}],
            "status": {"code": 0}
        });
        let req: DataRequest = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(req.request_id(), Some("abc"));
        assert_eq!(req.extra.get("status"), Some(&json!({"code": 0})));
        assert_eq!(serde_json::to_value(&req).unwrap(), raw);
    }

    #[test]
    fn test_request_id_missing() {
        let req = DataRequest::new(json!(null)).with_header(json!({"exec_endpoint": "/"}));
        assert_eq!(req.request_id(), None);
    }

    #[test]
    fn test_service_info_accepts_both_keys() {
        let a: ServiceInfo = serde_json::from_value(json!({"jina": {"python": "3.11"}})).unwrap();
        let b: ServiceInfo = serde_json::from_value(json!({"service": {"python": "3.11"}})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.version("python"), Some("3.11"));
        assert!(a.envs.is_empty());
    }

    #[test]
    fn test_status_error_message() {
        let err = FlowlinkError::Status(503);
        assert_eq!(err.to_string(), "got non 200 status code 503");
    }

    #[test]
    fn test_no_such_host_message() {
        let err = FlowlinkError::NoSuchHost("svc.example.com".into());
        assert_eq!(err.to_string(), "no such host: svc.example.com");
        assert!(err.io_kind().is_none());
    }

    #[test]
    fn test_connect_error_keeps_io_kind() {
        let err = FlowlinkError::Connect {
            addr: "10.0.0.1:80".into(),
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        };
        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::ConnectionRefused));
        assert!(err.to_string().contains("10.0.0.1:80"));
    }
}
