//! JSON schemas for structured model replies.
//!
//! Reply types derive `schemars::JsonSchema`; [`StructuredOutput::strict_schema`]
//! rewrites the generated schema into the form accepted by strict
//! `json_schema` response formats: every object closed with
//! `additionalProperties: false`, every property required, and no `$ref`s.

use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Nesting limit when inlining definitions.
const MAX_INLINE_DEPTH: usize = 32;

/// A type the model can be asked to produce directly.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    fn strict_schema() -> Value {
        let mut value = serde_json::to_value(schema_for!(Self)).unwrap_or_default();

        let definitions = match &mut value {
            Value::Object(map) => {
                map.remove("$schema");
                map.remove("definitions")
            }
            _ => None,
        };

        if let Some(Value::Object(defs)) = definitions {
            inline_refs(&mut value, &defs, 0);
        }
        close_objects(&mut value);
        value
    }

    /// Name sent alongside the schema.
    fn output_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn inline_refs(value: &mut Value, defs: &Map<String, Value>, depth: usize) {
    if depth > MAX_INLINE_DEPTH {
        return;
    }

    match value {
        Value::Object(map) => {
            let target = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|r| r.strip_prefix("#/definitions/"))
                .and_then(|name| defs.get(name))
                .cloned();

            if let Some(mut resolved) = target {
                inline_refs(&mut resolved, defs, depth + 1);
                *value = resolved;
                return;
            }

            for child in map.values_mut() {
                inline_refs(child, defs, depth);
            }
        }
        Value::Array(items) => {
            for item in items {
                inline_refs(item, defs, depth);
            }
        }
        _ => {}
    }
}

fn close_objects(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("object") {
                map.insert("additionalProperties".into(), Value::Bool(false));
                let keys: Vec<Value> = match map.get("properties") {
                    Some(Value::Object(props)) => props.keys().cloned().map(Value::String).collect(),
                    _ => Vec::new(),
                };
                map.insert("required".into(), Value::Array(keys));
            }
            for child in map.values_mut() {
                close_objects(child);
            }
        }
        Value::Array(items) => {
            for item in items {
                close_objects(item);
            }
        }
        _ => {}
    }
}
