//! Configuration model: matcher and schema entries rooted at a URL.

use crate::context::{RequestConfig, Response};
use crate::matcher::Matcher;
use crate::schema::Schema;
use std::fmt;

/// A single matcher + schema pair.
pub struct TransformerEntry<S> {
    /// Decides whether this entry applies
    pub matcher: Matcher<S>,
    /// Mapping applied to the matched payload data
    pub schema: Schema,
    /// Field of the data to scope the mapping to
    pub data_selector: Option<String>,
}

impl<S> TransformerEntry<S> {
    /// Create an entry mapping the whole data.
    pub fn new(matcher: impl Into<Matcher<S>>, schema: Schema) -> Self {
        Self {
            matcher: matcher.into(),
            schema,
            data_selector: None,
        }
    }

    /// Scope the mapping to `data[selector]`.
    pub fn with_data_selector(mut self, selector: impl Into<String>) -> Self {
        self.data_selector = Some(selector.into());
        self
    }
}

impl<S> Clone for TransformerEntry<S> {
    fn clone(&self) -> Self {
        Self {
            matcher: self.matcher.clone(),
            schema: self.schema.clone(),
            data_selector: self.data_selector.clone(),
        }
    }
}

impl<S> fmt::Debug for TransformerEntry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerEntry")
            .field("matcher", &self.matcher)
            .field("schema", &self.schema)
            .field("data_selector", &self.data_selector)
            .finish()
    }
}

impl<S> PartialEq for TransformerEntry<S> {
    fn eq(&self, other: &Self) -> bool {
        self.matcher == other.matcher
            && self.schema == other.schema
            && self.data_selector == other.data_selector
    }
}

pub type RequestEntry = TransformerEntry<RequestConfig>;
pub type ResponseEntry = TransformerEntry<Response>;

/// Request and response entries, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interceptors {
    pub requests: Vec<RequestEntry>,
    pub responses: Vec<ResponseEntry>,
}

/// Entries declared for one API surface.
///
/// `url` is the base URL path templates are joined onto. Configurations meant
/// to be combined use a relative `url` such as `/people`.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub url: String,
    pub interceptors: Interceptors,
}

impl Configuration {
    /// Create a configuration without entries.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            interceptors: Interceptors::default(),
        }
    }

    /// Append a request entry.
    pub fn request(mut self, entry: RequestEntry) -> Self {
        self.interceptors.requests.push(entry);
        self
    }

    /// Append a response entry.
    pub fn response(mut self, entry: ResponseEntry) -> Self {
        self.interceptors.responses.push(entry);
        self
    }

    /// Check whether the configuration declares no entries.
    pub fn is_empty(&self) -> bool {
        self.interceptors.requests.is_empty() && self.interceptors.responses.is_empty()
    }
}
