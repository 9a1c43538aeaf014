//! Result schemas and validation against them.

use jsonschema::{Draft, JSONSchema};
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named JSON Schema that structured output must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSchema {
    pub name: String,
    pub schema: Value,
}

impl ResultSchema {
    /// Wrap a schema value as-is.
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// Strict-mode schema generated from a Rust type.
    pub fn of<T: JsonSchema>() -> Self {
        let raw = serde_json::to_value(schema_for!(T)).unwrap_or_default();
        Self {
            name: T::schema_name(),
            schema: openai_client::strict_schema(raw),
        }
    }

    /// Check `instance` against this schema.
    pub fn validate(&self, instance: &Value) -> Result<(), String> {
        validate_json(&self.schema, instance)
    }

    /// Parse model text (code fences tolerated) and validate it.
    pub fn parse(&self, content: &str) -> Result<Value, String> {
        let text = openai_client::strip_code_blocks(content);
        if text.is_empty() {
            return Err("Empty response".to_string());
        }
        let value: Value =
            serde_json::from_str(text).map_err(|e| format!("response is not valid JSON: {e}"))?;
        self.validate(&value)?;
        Ok(value)
    }
}

/// Validate `instance` against a draft-07 schema, reporting up to five errors.
pub fn validate_json(schema: &Value, instance: &Value) -> Result<(), String> {
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|e| format!("schema does not compile: {e}"))?;

    let outcome = compiled.validate(instance).map_err(|errors| {
        errors
            .take(5)
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{path}: {e}")
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    });
    outcome
}
