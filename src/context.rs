//! Request and response payloads passed through the interceptor chains.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Outgoing request as seen by request interceptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    /// HTTP method
    pub method: String,
    /// Request URL (absent until the host client resolves it)
    #[serde(default)]
    pub url: Option<String>,
    /// Request headers (lowercased names)
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Request body
    #[serde(default)]
    pub data: JsonValue,
}

/// Incoming response as seen by response interceptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers (lowercased names)
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Response body
    #[serde(default)]
    pub data: JsonValue,
    /// The request that produced this response
    pub config: RequestConfig,
}

/// Anything a matcher can inspect and a transformer can reshape.
pub trait Payload {
    /// URL used by regex and path matchers.
    fn effective_url(&self) -> Option<&str>;

    /// Body data the mapping is applied to.
    fn data_mut(&mut self) -> &mut JsonValue;
}

impl RequestConfig {
    /// Create a request with an empty body.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: Some(url.into()),
            headers: HashMap::new(),
            data: JsonValue::Null,
        }
    }

    /// Attach a body.
    pub fn with_data(mut self, data: JsonValue) -> Self {
        self.data = data;
        self
    }

    /// Add a header. The name is stored lowercased.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_lowercase(), value.into());
        self
    }

    /// Get a single header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }
}

impl Response {
    /// Create a response to `config`.
    pub fn new(config: RequestConfig, status: u16, data: JsonValue) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            data,
            config,
        }
    }

    /// Get a single header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }
}

impl Payload for RequestConfig {
    fn effective_url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn data_mut(&mut self) -> &mut JsonValue {
        &mut self.data
    }
}

impl Payload for Response {
    fn effective_url(&self) -> Option<&str> {
        self.config.url.as_deref()
    }

    fn data_mut(&mut self) -> &mut JsonValue {
        &mut self.data
    }
}
