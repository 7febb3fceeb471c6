//! Lenient conversions from loosely typed agent JSON into normalized fields.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// A trimmed, non-empty string. Numbers and booleans are rendered as text.
pub(crate) fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn first_text(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| text(object.get(*key)))
}

/// A single string is treated as a one-element list.
pub(crate) fn text_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(|item| text(Some(item))).collect(),
        Some(other) => text(Some(other)).into_iter().collect(),
        None => Vec::new(),
    }
}

pub(crate) fn first_list(object: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .map(|key| text_list(object.get(*key)))
        .find(|list| !list.is_empty())
        .unwrap_or_default()
}

/// Numbers, or strings such as "₹1,299.00" with the non-numeric characters stripped.
pub(crate) fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            cleaned.parse().ok()
        }
        _ => None,
    }
}

pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(text(value.as_ref()))
}

/// Anything that is not an array becomes an empty list; elements are converted infallibly.
pub(crate) fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<Value>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Ok(items.into_iter().map(T::from).collect()),
        _ => Ok(Vec::new()),
    }
}
