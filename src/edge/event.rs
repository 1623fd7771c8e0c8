//! Viewer-request event as delivered by the edge fabric.
//!
//! Shape:
//! ```json
//! {"Records":[{"cf":{"config":{...},"request":{"method":"GET","uri":"/","headers":{...}}}}]}
//! ```
//!
//! The request is held as the JSON object it arrived as. `method` and `headers`
//! are read through accessors; nothing is added, dropped or reordered, so a
//! granted request serializes back to the bytes it was parsed from.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Header map keyed by lowercase header name. Each name carries an ordered list of values.
pub type Headers = IndexMap<String, Vec<HeaderEntry>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    // Original casing of the header name; optional on the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            key: None,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EdgeEvent {
    #[serde(default)]
    pub records: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdgeRecord {
    #[serde(default)]
    pub cf: Option<CfPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CfPayload {
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub request: Option<EdgeRequest>,
}

impl EdgeEvent {
    /// The request of the first record; the fabric sends exactly one.
    pub fn into_request(self) -> Option<EdgeRequest> {
        self.records
            .into_iter()
            .next()
            .and_then(|record| record.cf)
            .and_then(|cf| cf.request)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeRequest {
    fields: Map<String, Value>,
}

impl EdgeRequest {
    pub fn new(method: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("method".to_string(), Value::String(method.into()));
        Self { fields }
    }

    /// Append a header value, creating `headers` on first use.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let headers = self
            .fields
            .entry("headers")
            .or_insert_with(|| Value::Object(Map::new()));

        if let Value::Object(headers) = headers {
            let values = headers
                .entry(name.to_ascii_lowercase())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(values) = values {
                values.push(json!({ "value": value.into() }));
            }
        }
        self
    }

    /// `method` as sent; empty when absent or not a string.
    pub fn method(&self) -> &str {
        self.fields
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn is_preflight(&self) -> bool {
        self.method().eq_ignore_ascii_case("OPTIONS")
    }

    /// First value of `name`, comparing header names case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.fields
            .get("headers")?
            .as_object()?
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))?
            .1
            .as_array()?
            .first()?
            .get("value")?
            .as_str()
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWER_REQUEST: &str = r#"{
        "Records": [{
            "cf": {
                "config": {
                    "distributionDomainName": "d111111abcdef8.cloudfront.net",
                    "distributionId": "EDFDVBD6EXAMPLE",
                    "eventType": "viewer-request",
                    "requestId": "4TyzHTaYWb1GX1qTfsHhEqV6HUDd_BzoBZnwfnvQc_1oF26ClkoUSEQ=="
                },
                "request": {
                    "clientIp": "203.0.113.178",
                    "headers": {
                        "host": [{"key": "Host", "value": "d111111abcdef8.cloudfront.net"}],
                        "authorization": [{"key": "Authorization", "value": "abc.def.ghi"}],
                        "accept": [{"key": "accept", "value": "*/*"}]
                    },
                    "method": "GET",
                    "querystring": "size=LARGE",
                    "uri": "/picture.jpg"
                }
            }
        }]
    }"#;

    #[test]
    fn parses_viewer_request_event() {
        let event: EdgeEvent = serde_json::from_str(VIEWER_REQUEST).unwrap();
        let request = event.into_request().unwrap();

        assert_eq!(request.method(), "GET");
        assert_eq!(request.header("authorization"), Some("abc.def.ghi"));
        assert_eq!(request.field("uri"), Some(&Value::from("/picture.jpg")));
        assert_eq!(request.field("querystring"), Some(&Value::from("size=LARGE")));
    }

    #[test]
    fn header_lookup_ignores_name_case() {
        let request = EdgeRequest::new("GET").with_header("Authorization", "token");

        assert_eq!(request.header("authorization"), Some("token"));
        assert_eq!(request.header("AUTHORIZATION"), Some("token"));
        assert_eq!(request.header("cookie"), None);
    }

    #[test]
    fn header_lookup_returns_first_value() {
        let request = EdgeRequest::new("GET")
            .with_header("authorization", "first")
            .with_header("authorization", "second");

        assert_eq!(request.header("authorization"), Some("first"));
    }

    #[test]
    fn header_lookup_tolerates_odd_shapes() {
        let request: EdgeRequest = serde_json::from_str(
            r#"{"method": "GET", "headers": {"authorization": "raw", "cookie": []}}"#,
        )
        .unwrap();

        assert_eq!(request.header("authorization"), None);
        assert_eq!(request.header("cookie"), None);
    }

    #[test]
    fn preflight_detection_ignores_method_case() {
        assert!(EdgeRequest::new("OPTIONS").is_preflight());
        assert!(EdgeRequest::new("options").is_preflight());
        assert!(!EdgeRequest::new("GET").is_preflight());
    }

    #[test]
    fn request_serializes_back_to_the_same_bytes() {
        let raw = r#"{"clientIp":"203.0.113.9","uri":"/","headers":{"accept":[{"key":"Accept","value":"*/*"}]},"method":"GET","querystring":""}"#;

        let request: EdgeRequest = serde_json::from_str(raw).unwrap();

        assert_eq!(serde_json::to_string(&request).unwrap(), raw);
    }

    #[test]
    fn request_without_headers_is_not_given_any() {
        let raw = r#"{"clientIp":"203.0.113.9","method":"GET","uri":"/"}"#;

        let request: EdgeRequest = serde_json::from_str(raw).unwrap();

        assert_eq!(request.header("authorization"), None);
        assert_eq!(serde_json::to_string(&request).unwrap(), raw);
    }

    #[test]
    fn event_without_records_has_no_request() {
        let event: EdgeEvent = serde_json::from_str(r#"{"Records": []}"#).unwrap();
        assert!(event.into_request().is_none());

        let event: EdgeEvent = serde_json::from_str("{}").unwrap();
        assert!(event.into_request().is_none());
    }

    #[test]
    fn record_without_request_has_no_request() {
        let event: EdgeEvent = serde_json::from_str(
            r#"{"Records": [{"cf": {"config": {"eventType": "viewer-request"}}}]}"#,
        )
        .unwrap();
        assert!(event.into_request().is_none());

        let event: EdgeEvent = serde_json::from_str(r#"{"Records": [{}]}"#).unwrap();
        assert!(event.into_request().is_none());
    }
}
