//! Forgiving readers for fields the actions script fills loosely.
//!
//! The script answers with whatever its PHP side produced: flags may be `1`/`"1"`,
//! logs may be a single string or contain numbers. A body that arrived is never
//! rejected because of such a field.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// JavaScript truthiness of a JSON value.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Scalar as display text; strings stay unquoted, `null` has none.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub(crate) fn deserialize_flag<'de, D>(d: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(d)?;
    Ok(truthy(&value))
}

/// `null` stays unknown, anything else is read as a flag.
pub(crate) fn deserialize_optional_flag<'de, D>(d: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(d)?;
    Ok((!value.is_null()).then(|| truthy(&value)))
}

pub(crate) fn deserialize_text<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(d)?;
    Ok(text(&value))
}

/// A string is one line, an array is one line per item.
pub(crate) fn deserialize_lines<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let lines = match Value::deserialize(d)? {
        Value::Array(items) => items.iter().filter_map(text).collect(),
        other => text(&other).into_iter().collect(),
    };
    Ok(lines)
}

/// Array items as-is; anything else reads as empty.
pub(crate) fn deserialize_items<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<Value>,
{
    let items = match Value::deserialize(d)? {
        Value::Array(items) => items.into_iter().map(T::from).collect(),
        _ => Vec::new(),
    };
    Ok(items)
}
