//! Strict JSON schemas for OpenAI structured outputs.
//!
//! `schemars` produces draft-07 schemas with `definitions` and `$ref`s. OpenAI's
//! strict mode wants something narrower:
//!
//! 1. `additionalProperties: false` on every object
//! 2. every property listed in `required` (nullable ones included)
//! 3. no `$ref`, no `definitions`, no `$schema`
//!
//! [`strict_schema`] rewrites any schema value into that shape, and
//! [`StructuredOutput`] applies it to a Rust type.
//!
//! ```rust,ignore
//! #[derive(Deserialize, JsonSchema)]
//! struct LineItem {
//!     part_number: Option<String>,
//!     quantity: u32,
//! }
//!
//! let schema = LineItem::openai_schema();
//! ```

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Types usable as an OpenAI structured output.
///
/// Blanket-implemented for anything that is `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Strict-mode schema for this type.
    fn openai_schema() -> Value {
        let schema = schema_for!(Self);
        strict_schema(serde_json::to_value(schema).unwrap_or_default())
    }

    /// Schema name, used as the `json_schema.name` on the wire.
    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Rewrite an arbitrary JSON schema into OpenAI strict-mode form.
pub fn strict_schema(mut value: Value) -> Value {
    close_objects(&mut value);
    inline_refs(&mut value);

    if let Value::Object(map) = &mut value {
        map.remove("definitions");
        map.remove("$defs");
        map.remove("$schema");
    }

    value
}

fn close_objects(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("object") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));

                if let Some(Value::Object(props)) = map.get("properties") {
                    let keys: Vec<Value> = props.keys().cloned().map(Value::String).collect();
                    map.insert("required".to_string(), Value::Array(keys));
                }
            }

            for (_, v) in map.iter_mut() {
                close_objects(v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(close_objects),
        _ => {}
    }
}

fn inline_refs(value: &mut Value) {
    let definitions = match value {
        Value::Object(map) => map.get("definitions").or_else(|| map.get("$defs")).cloned(),
        _ => None,
    };

    if let Some(defs) = definitions {
        inline_refs_with(value, &defs);
    }
}

fn inline_refs_with(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            let target = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|path| {
                    path.strip_prefix("#/definitions/")
                        .or_else(|| path.strip_prefix("#/$defs/"))
                })
                .and_then(|name| definitions.get(name))
                .cloned();

            if let Some(def) = target {
                *value = def;
                inline_refs_with(value, definitions);
                return;
            }

            for (_, v) in map.iter_mut() {
                inline_refs_with(v, definitions);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                inline_refs_with(item, definitions);
            }
        }
        _ => {}
    }
}
