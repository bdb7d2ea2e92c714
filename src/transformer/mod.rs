//! Transformers applying a mapping to matched requests and responses.

mod data;

pub use data::apply_transform;

use crate::context::{Payload, RequestConfig, Response};
use crate::matcher::CompiledMatcher;
use crate::model::TransformerEntry;
use crate::schema::{MapError, Mapper};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Entry bound to a base URL and a mapper.
///
/// An entry whose matcher fails to compile never matches.
pub struct EntryTransformer<S> {
    matcher: Option<CompiledMatcher<S>>,
    entry: TransformerEntry<S>,
    mapper: Arc<dyn Mapper>,
}

pub type RequestTransform = EntryTransformer<RequestConfig>;
pub type ResponseTransform = EntryTransformer<Response>;

impl<S: Payload> EntryTransformer<S> {
    /// Bind `entry` to `base_url`.
    pub fn new(base_url: &str, entry: &TransformerEntry<S>, mapper: Arc<dyn Mapper>) -> Self {
        let matcher = match CompiledMatcher::compile(base_url, &entry.matcher) {
            Ok(matcher) => Some(matcher),
            Err(e) => {
                warn!(
                    base_url,
                    matcher = ?entry.matcher,
                    error = %e,
                    "Matcher failed to compile, entry disabled"
                );
                None
            }
        };

        Self {
            matcher,
            entry: entry.clone(),
            mapper,
        }
    }

    /// Apply the mapping if the subject matches, otherwise return it unchanged.
    pub fn apply(&self, subject: S) -> Result<S, TransformError> {
        let Some(matcher) = &self.matcher else {
            return Ok(subject);
        };

        let result = matcher.matches(&subject);
        if !result.matched {
            trace!(
                matcher = %matcher.describe(),
                url = ?subject.effective_url(),
                "No match"
            );
            return Ok(subject);
        }

        debug!(
            matcher = %matcher.describe(),
            url = ?subject.effective_url(),
            data_selector = ?self.entry.data_selector,
            captures = ?result.captures,
            "Applying mapping"
        );

        apply_transform(&self.entry, self.mapper.as_ref(), subject)
    }

    /// Whether the matcher compiled.
    pub fn is_active(&self) -> bool {
        self.matcher.is_some()
    }
}

/// Create a transformer for a response entry.
pub fn create_response_transform(
    base_url: &str,
    entry: &TransformerEntry<Response>,
    mapper: Arc<dyn Mapper>,
) -> ResponseTransform {
    EntryTransformer::new(base_url, entry, mapper)
}

/// Create a transformer for a request entry.
pub fn create_request_transform(
    base_url: &str,
    entry: &TransformerEntry<RequestConfig>,
    mapper: Arc<dyn Mapper>,
) -> RequestTransform {
    EntryTransformer::new(base_url, entry, mapper)
}

/// Errors that can occur while transforming a payload.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Mapping failed: {0}")]
    Mapping(#[from] MapError),

    #[error("Cannot select '{selector}' from non-object data")]
    SelectorOnNonObject { selector: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Matcher;
    use crate::schema::{Schema, SchemaMapper};
    use serde_json::{json, Value as JsonValue};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BASE_URL: &str = "https://swapi.co/api";

    /// Counts projections before delegating to the built-in mapper.
    #[derive(Default)]
    struct CountingMapper {
        calls: AtomicUsize,
    }

    impl Mapper for CountingMapper {
        fn project(&self, schema: &Schema, source: &JsonValue) -> Result<JsonValue, MapError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            SchemaMapper.project(schema, source)
        }
    }

    fn people_schema() -> Schema {
        Schema::new()
            .field("name", "name")
            .field("height", "height")
    }

    fn make_response(path: &str, data: JsonValue) -> Response {
        Response::new(
            RequestConfig::new("GET", format!("{BASE_URL}{path}")),
            200,
            data,
        )
    }

    #[test]
    fn test_non_matching_response_is_untouched() {
        let mapper = Arc::new(CountingMapper::default());
        let entry = TransformerEntry::new("/planets/:id", people_schema());
        let transform = create_response_transform(BASE_URL, &entry, mapper.clone());

        let data = json!({"name": "Luke", "height": "172", "mass": "77"});
        let response = transform
            .apply(make_response("/people/1", data.clone()))
            .unwrap();

        assert_eq!(response.data, data);
        assert_eq!(mapper.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_matching_response_replaces_data() {
        let entry = TransformerEntry::new("/people/:id", people_schema());
        let transform = create_response_transform(BASE_URL, &entry, Arc::new(SchemaMapper));
        assert!(transform.is_active());

        let response = transform
            .apply(make_response(
                "/people/1",
                json!({"name": "Luke", "height": "172", "mass": "77"}),
            ))
            .unwrap();

        assert_eq!(response.data, json!({"name": "Luke", "height": "172"}));
        assert_eq!(response.status, 200);
    }

    #[test]
    fn test_data_selector_leaves_siblings() {
        let entry = TransformerEntry::new("/people", Schema::new().field("name", "name"))
            .with_data_selector("results");
        let transform = create_response_transform(BASE_URL, &entry, Arc::new(SchemaMapper));

        let response = transform
            .apply(make_response(
                "/people",
                json!({
                    "count": 1,
                    "next": null,
                    "results": [{"name": "Luke", "height": "172"}]
                }),
            ))
            .unwrap();

        assert_eq!(
            response.data,
            json!({"count": 1, "next": null, "results": [{"name": "Luke"}]})
        );
    }

    #[test]
    fn test_predicate_maps_exactly_once() {
        let mapper = Arc::new(CountingMapper::default());
        let entry = TransformerEntry::new(
            Matcher::<Response>::predicate(|response: &Response| {
                response.data["Operation"] == "people"
            }),
            people_schema(),
        )
        .with_data_selector("data");
        let transform = create_response_transform("/", &entry, mapper.clone());

        let response = transform
            .apply(make_response(
                "",
                json!({"Operation": "people", "data": {"name": "Luke", "mass": "77"}}),
            ))
            .unwrap();

        assert_eq!(response.data["data"], json!({"name": "Luke"}));
        assert_eq!(response.data["Operation"], "people");
        assert_eq!(mapper.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_request_transform_maps_body() {
        let entry = TransformerEntry::new(
            Matcher::<RequestConfig>::regex(r"people/id$").unwrap(),
            Schema::new().field("name", "name"),
        );
        let transform = create_request_transform(BASE_URL, &entry, Arc::new(SchemaMapper));

        let request = RequestConfig::new("POST", format!("{BASE_URL}/people/id"))
            .with_data(json!({"name": "Luke", "height": "172"}));
        let request = transform.apply(request).unwrap();

        assert_eq!(request.data, json!({"name": "Luke"}));
    }

    #[test]
    fn test_uncompilable_template_passes_through() {
        // Exceeds the compiled regex size limit
        let template = "/:segment".repeat(100_000);
        let mapper = Arc::new(CountingMapper::default());
        let entry = TransformerEntry::new(template, people_schema());
        let transform = create_response_transform(BASE_URL, &entry, mapper.clone());
        assert!(!transform.is_active());

        let data = json!({"name": "Luke", "height": "172", "mass": "77"});
        let response = transform
            .apply(make_response("/people/1", data.clone()))
            .unwrap();

        assert_eq!(response.data, data);
        assert_eq!(mapper.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_mapping_error_propagates() {
        let entry = TransformerEntry::new("/people", people_schema()).with_data_selector("results");
        let transform = create_response_transform(BASE_URL, &entry, Arc::new(SchemaMapper));

        let err = transform
            .apply(make_response("/people", json!({"count": 0})))
            .unwrap_err();
        assert!(matches!(err, TransformError::Mapping(MapError::UndefinedSource)));
    }
}
