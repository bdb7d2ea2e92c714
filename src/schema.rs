//! Mapping schemas and the mapper that projects source objects through them.
//!
//! A [`Schema`] maps target keys to rules describing where each value comes
//! from. The [`Mapper`] trait is the boundary the transformers use; any
//! projection engine can sit behind it. [`SchemaMapper`] is the built-in one.
//!
//! ```yaml
//! name: name                # copy `name`
//! homeworld: links.planet   # dotted source path
//! first_film: films[0]      # indexed source path
//! stats:                    # nested schema over the same source
//!   height: height
//!   mass: mass
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Function computing a target value from the whole source object.
pub type FieldFn = Arc<dyn Fn(&JsonValue) -> JsonValue + Send + Sync>;

/// Projects source values through a schema.
pub trait Mapper: Send + Sync {
    /// Project `source` through `schema`.
    ///
    /// Arrays are projected element by element; an object yields an object.
    fn project(&self, schema: &Schema, source: &JsonValue) -> Result<JsonValue, MapError>;
}

/// Target key to source rule mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: BTreeMap<String, FieldRule>,
}

/// How a single target value is produced.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldRule {
    /// Copy the value found at a source path
    Path(String),
    /// Project the same source through a nested schema
    Nested(Schema),
    /// Compute the value from the source object
    #[serde(skip)]
    Function(FieldFn),
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the value at `source_path` into `target`.
    pub fn field(mut self, target: impl Into<String>, source_path: impl Into<String>) -> Self {
        self.fields
            .insert(target.into(), FieldRule::Path(source_path.into()));
        self
    }

    /// Project the source through `schema` into `target`.
    pub fn nested(mut self, target: impl Into<String>, schema: Schema) -> Self {
        self.fields.insert(target.into(), FieldRule::Nested(schema));
        self
    }

    /// Compute `target` from the whole source object.
    pub fn computed<F>(mut self, target: impl Into<String>, f: F) -> Self
    where
        F: Fn(&JsonValue) -> JsonValue + Send + Sync + 'static,
    {
        self.fields
            .insert(target.into(), FieldRule::Function(Arc::new(f)));
        self
    }

    /// Iterate over the target keys and their rules.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &FieldRule)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Schema
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Schema::new(), |schema, (target, source)| {
                schema.field(target, source)
            })
    }
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Nested(schema) => f.debug_tuple("Nested").field(schema).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl PartialEq for FieldRule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Path(a), Self::Path(b)) => a == b,
            (Self::Nested(a), Self::Nested(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Built-in mapper.
///
/// Missing source paths leave the target key out of the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaMapper;

impl Mapper for SchemaMapper {
    fn project(&self, schema: &Schema, source: &JsonValue) -> Result<JsonValue, MapError> {
        match source {
            JsonValue::Array(items) => Ok(JsonValue::Array(
                items
                    .iter()
                    .map(|item| project_object(schema, item))
                    .collect(),
            )),
            JsonValue::Object(_) => Ok(project_object(schema, source)),
            JsonValue::Null => Err(MapError::UndefinedSource),
            other => Err(MapError::UnsupportedSource(value_kind(other))),
        }
    }
}

fn project_object(schema: &Schema, source: &JsonValue) -> JsonValue {
    let mut target = serde_json::Map::new();

    for (key, rule) in schema.fields() {
        let value = match rule {
            FieldRule::Path(path) => get_json_value(source, path).cloned(),
            FieldRule::Nested(nested) => Some(project_object(nested, source)),
            FieldRule::Function(f) => Some(f(source)),
        };
        if let Some(value) = value {
            target.insert(key.clone(), value);
        }
    }

    JsonValue::Object(target)
}

fn value_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PathSegment {
    Key(String),
    Index(usize),
}

/// Parse a source path into segments.
/// Supports: field, field.subfield, array[0], field[0].subfield, with an optional `$.` prefix
fn parse_path(path: &str) -> Vec<PathSegment> {
    let path = path.trim_start_matches("$.");
    let path = path.trim_start_matches('$');

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }
                let idx: String = chars.by_ref().take_while(|&c| c != ']').collect();
                if let Ok(idx) = idx.parse::<usize>() {
                    segments.push(PathSegment::Index(idx));
                }
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() {
        segments.push(PathSegment::Key(current));
    }

    segments
}

/// Get a reference to a JSON value at a source path.
fn get_json_value<'a>(json: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    parse_path(path)
        .into_iter()
        .try_fold(json, |current, segment| match segment {
            PathSegment::Key(key) => current.get(&key),
            PathSegment::Index(idx) => current.get(idx),
        })
}

/// Errors raised by a mapper.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Cannot project an undefined source")]
    UndefinedSource,

    #[error("Cannot project a {0} source, expected an object or an array")]
    UnsupportedSource(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn luke() -> JsonValue {
        json!({
            "name": "Luke Skywalker",
            "height": "172",
            "mass": "77",
            "hair_color": "blond",
            "links": {"planet": "Tatooine"},
            "films": ["A New Hope", "The Empire Strikes Back"]
        })
    }

    #[test]
    fn test_parse_path() {
        assert_eq!(
            parse_path("$.links.planet"),
            vec![
                PathSegment::Key("links".into()),
                PathSegment::Key("planet".into())
            ]
        );
        assert_eq!(
            parse_path("films[1]"),
            vec![PathSegment::Key("films".into()), PathSegment::Index(1)]
        );
        assert!(parse_path("$").is_empty());
    }

    #[test]
    fn test_project_object_keeps_only_schema_fields() {
        let schema: Schema = [("name", "name"), ("height", "height"), ("mass", "mass")]
            .into_iter()
            .collect();

        let output = SchemaMapper.project(&schema, &luke()).unwrap();
        assert_eq!(
            output,
            json!({"name": "Luke Skywalker", "height": "172", "mass": "77"})
        );
    }

    #[test]
    fn test_project_array_element_wise() {
        let schema = Schema::new().field("name", "name");
        let source = json!([{"name": "Tatooine", "climate": "arid"}, {"name": "Hoth"}]);

        let output = SchemaMapper.project(&schema, &source).unwrap();
        assert_eq!(output, json!([{"name": "Tatooine"}, {"name": "Hoth"}]));
    }

    #[test]
    fn test_nested_and_indexed_paths() {
        let schema = Schema::new()
            .field("homeworld", "links.planet")
            .field("first_film", "films[0]")
            .nested("stats", Schema::new().field("height", "height"));

        let output = SchemaMapper.project(&schema, &luke()).unwrap();
        assert_eq!(output["homeworld"], "Tatooine");
        assert_eq!(output["first_film"], "A New Hope");
        assert_eq!(output["stats"], json!({"height": "172"}));
    }

    #[test]
    fn test_missing_path_is_omitted() {
        let schema = Schema::new().field("name", "name").field("age", "age");
        let output = SchemaMapper.project(&schema, &luke()).unwrap();
        assert!(output.get("age").is_none());
        assert_eq!(output["name"], "Luke Skywalker");
    }

    #[test]
    fn test_computed_field() {
        let schema = Schema::new().computed("film_count", |source| {
            json!(source["films"].as_array().map_or(0, |films| films.len()))
        });
        let output = SchemaMapper.project(&schema, &luke()).unwrap();
        assert_eq!(output["film_count"], 2);
    }

    #[test]
    fn test_undefined_source_errors() {
        let schema = Schema::new().field("name", "name");
        let err = SchemaMapper.project(&schema, &JsonValue::Null).unwrap_err();
        assert!(matches!(err, MapError::UndefinedSource));

        let err = SchemaMapper.project(&schema, &json!("luke")).unwrap_err();
        assert!(matches!(err, MapError::UnsupportedSource("string")));
    }

    #[test]
    fn test_schema_from_yaml() {
        let yaml = r#"
name: name
stats:
  height: height
"#;
        let schema: Schema = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(
            schema,
            Schema::new()
                .field("name", "name")
                .nested("stats", Schema::new().field("height", "height"))
        );
    }
}
