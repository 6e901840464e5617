//! The seam between the fetch orchestrator and the wire.

use async_trait::async_trait;
use thiserror::Error;

/// A GET request relative to the backend's API root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl Request {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn params(mut self, params: Vec<(String, String)>) -> Self {
        self.params.extend(params);
        self
    }

    /// Value of the first parameter named `key`.
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw failure reported by a transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Connect(_) | TransportError::Timeout => true,
            TransportError::Status(status) => *status >= 500,
            TransportError::Other(_) => false,
        }
    }
}

/// Performs a single attempt of a request and returns the raw response body.
///
/// Implementations must not retry or apply their own timeout policy; the
/// orchestrator owns both.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &Request) -> Result<Vec<u8>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(TransportError::Timeout.is_transient());
        assert!(TransportError::Connect("refused".into()).is_transient());
        assert!(TransportError::Status(502).is_transient());
        assert!(!TransportError::Status(404).is_transient());
        assert!(!TransportError::Status(400).is_transient());
        assert!(!TransportError::Other("bad body".into()).is_transient());
    }

    #[test]
    fn request_builder_keeps_param_order() {
        let request = Request::new("topactions")
            .param("date", "2025-07-26")
            .params(vec![("group".into(), "Democrat".into())]);
        assert_eq!(request.get_param("date"), Some("2025-07-26"));
        assert_eq!(request.get_param("group"), Some("Democrat"));
        assert_eq!(request.get_param("publisher"), None);
        assert_eq!(request.params[0].0, "date");
    }
}
