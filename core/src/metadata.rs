//! Open metadata maps.
//!
//! The metadata schema is configured on the server, so the client treats it
//! as a plain JSON object and echoes values verbatim, with one exception:
//! the server does not clear a field sent as `[]`, only one sent as `""`.
//! [`encode_metadata`] applies that rewrite before the map goes on the wire.

use serde_json::{Map, Value};

/// Field name to value; values are strings, numbers, booleans, lists or
/// nested objects.
pub type Metadata = Map<String, Value>;

/// Rewrite top-level empty arrays to empty strings.
pub fn normalize_metadata(metadata: &Metadata) -> Metadata {
    metadata
        .iter()
        .map(|(field, value)| {
            let value = match value {
                Value::Array(items) if items.is_empty() => Value::String(String::new()),
                other => other.clone(),
            };
            (field.clone(), value)
        })
        .collect()
}

/// The JSON string sent as the `metadata` form field.
pub fn encode_metadata(metadata: &Metadata) -> Result<String, serde_json::Error> {
    serde_json::to_string(&normalize_metadata(metadata))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn metadata(value: Value) -> Metadata {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_array_becomes_empty_string() {
        let encoded = encode_metadata(&metadata(json!({"tags": []}))).unwrap();
        assert_eq!(encoded, r#"{"tags":""}"#);
    }

    #[test]
    fn non_empty_values_are_untouched() {
        let input = metadata(json!({
            "tags": ["a", "b"],
            "rating": 3,
            "approved": true,
            "nested": {"list": []}
        }));
        let normalized = normalize_metadata(&input);
        assert_eq!(normalized, input);
    }
}
