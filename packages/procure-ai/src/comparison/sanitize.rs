//! Converting storage values into JSON-safe primitives.

use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Number, Value};

use crate::error::SanitizeError;
use crate::types::FieldValue;

/// Convert a field value to JSON.
///
/// Decimals become numbers, dates and datetimes ISO-8601 strings, UUIDs
/// strings, bytes lossy UTF-8. Lists and maps are converted recursively.
/// `path` names the field in errors.
pub fn sanitize(path: &str, value: &FieldValue) -> Result<Value, SanitizeError> {
    Ok(match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::Int(i) => Value::from(*i),
        FieldValue::Float(f) => Value::Number(
            Number::from_f64(*f).ok_or_else(|| SanitizeError::NonFinite {
                path: path.to_string(),
            })?,
        ),
        FieldValue::Decimal(d) => {
            let number = d
                .to_f64()
                .and_then(Number::from_f64)
                .ok_or_else(|| SanitizeError::Decimal {
                    path: path.to_string(),
                })?;
            Value::Number(number)
        }
        FieldValue::Text(s) => Value::String(s.clone()),
        FieldValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        FieldValue::DateTime(dt) => Value::String(dt.to_rfc3339()),
        FieldValue::Uuid(u) => Value::String(u.to_string()),
        FieldValue::Bytes(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
        FieldValue::List(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| sanitize(&format!("{path}[{i}]"), v))
                .collect::<Result<_, _>>()?,
        ),
        FieldValue::Map(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, v) in map {
                out.insert(key.clone(), sanitize(&format!("{path}.{key}"), v)?);
            }
            Value::Object(out)
        }
    })
}
