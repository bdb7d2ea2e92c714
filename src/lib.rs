//! Declarative body mapping for HTTP client interceptors.
//!
//! A [`Configuration`] pairs matchers with mapping schemas. Applying it to an
//! [`InterceptorHost`] registers one interceptor per entry that reshapes
//! request or response bodies whose URL (or content) matches:
//!
//! - Path templates (`/people/:id`) resolved against the configuration URL
//! - Regular expressions over the full URL
//! - Arbitrary predicates over the payload
//! - Optional `data_selector` to reshape only one field of the body
//! - [`combine`] to merge configurations declared with relative URLs
//!
//! ## Configuration Example
//!
//! ```yaml
//! version: "1"
//! configurations:
//!   - url: "https://swapi.co/api"
//!     interceptors:
//!       responses:
//!         - matcher: "/people/:id"
//!           schema: { name: name, height: height }
//!         - matcher: { pattern: "planets/?$", type: regex }
//!           schema: { name: name }
//!           data_selector: results
//! ```

pub mod binder;
pub mod combine;
pub mod config;
pub mod context;
pub mod host;
pub mod matcher;
pub mod model;
pub mod schema;
pub mod transformer;

pub use binder::{apply, apply_with_mapper, InterceptorSubscription};
pub use combine::combine;
pub use config::{ConfigError, MorphConfig};
pub use context::{Payload, RequestConfig, Response};
pub use host::{InterceptorChain, InterceptorHost, InterceptorId};
pub use matcher::{Matcher, MatcherError};
pub use model::{Configuration, Interceptors, RequestEntry, ResponseEntry, TransformerEntry};
pub use schema::{FieldRule, MapError, Mapper, Schema, SchemaMapper};
pub use transformer::{apply_transform, TransformError};
