//! Applying a schema to payload data.

use super::TransformError;
use crate::context::Payload;
use crate::model::TransformerEntry;
use crate::schema::Mapper;
use serde_json::Value as JsonValue;

/// Project the payload data through the entry's schema.
///
/// With a data selector only `data[selector]` is projected and written back,
/// leaving sibling fields alone. A missing selected field is handed to the
/// mapper as `null`.
pub fn apply_transform<S: Payload>(
    entry: &TransformerEntry<S>,
    mapper: &dyn Mapper,
    mut payload: S,
) -> Result<S, TransformError> {
    let null = JsonValue::Null;
    let data = payload.data_mut();

    match entry.data_selector.as_deref() {
        Some(selector) => {
            let JsonValue::Object(fields) = data else {
                return Err(TransformError::SelectorOnNonObject {
                    selector: selector.to_string(),
                });
            };
            let source = fields.get(selector).unwrap_or(&null);
            let mapped = mapper.project(&entry.schema, source)?;
            fields.insert(selector.to_string(), mapped);
        }
        None => {
            *data = mapper.project(&entry.schema, data)?;
        }
    }

    Ok(payload)
}
