//! Request shape
//!
//! The only surface the service layer reads from an inbound request:
//! `{params, query, body}`. Transport semantics (headers, status codes)
//! are not interpreted here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Path parameters extracted by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathParams {
    /// Record id for id-addressed operations, as received (unparsed).
    pub id: Option<String>,
    /// Field names for wildcard search.
    pub keys: Vec<String>,
}

/// Request body, split into the three shapes the operations read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Create payload.
    pub fields: Map<String, Value>,
    /// Update payload.
    pub data: Map<String, Value>,
    /// Condition options for bulk mutations.
    pub options: Map<String, Value>,
}

/// An inbound request as seen by the record service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub params: PathParams,
    /// Query-string filters; also carries the wildcard `keyword`.
    pub query: Map<String, Value>,
    pub body: RequestBody,
}

impl ServiceRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.params.id = Some(id.into());
        self
    }

    /// Set the wildcard search keys.
    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Add a query-string entry.
    pub fn with_query(mut self, key: impl Into<String>, value: Value) -> Self {
        self.query.insert(key.into(), value);
        self
    }

    /// Set the create payload.
    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.body.fields = fields;
        self
    }

    /// Set the update payload.
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.body.data = data;
        self
    }

    /// Set the bulk-mutation condition options.
    pub fn with_options(mut self, options: Map<String, Value>) -> Self {
        self.body.options = options;
        self
    }

    /// The wildcard keyword, if present and a string.
    pub fn keyword(&self) -> Option<&str> {
        self.query.get("keyword").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_shape() {
        let request = ServiceRequest::new()
            .with_id("abc")
            .with_keys(["name", "email"])
            .with_query("keyword", json!("foo"));

        assert_eq!(request.params.id.as_deref(), Some("abc"));
        assert_eq!(request.params.keys, vec!["name", "email"]);
        assert_eq!(request.keyword(), Some("foo"));
    }

    #[test]
    fn test_keyword_requires_string() {
        let request = ServiceRequest::new().with_query("keyword", json!(42));
        assert_eq!(request.keyword(), None);
        assert_eq!(ServiceRequest::new().keyword(), None);
    }
}
