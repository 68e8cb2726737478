//! Loosely-typed client input.
//!
//! A request body is a flat JSON object whose values may be numbers, booleans,
//! strings or null. Nothing here rejects input: values that are not scalars are
//! kept as text, which every decoder treats as unparseable and maps to the
//! field default.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// A single raw field value as supplied by a client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// The value as a number when it was sent as one. Booleans count as 1 and 0.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::Null | FieldValue::Text(_) => None,
        }
    }

    /// Trimmed, lower-cased text for string values only.
    pub fn normalized_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.trim().to_lowercase()),
            _ => None,
        }
    }

    /// Best-effort float cast: numbers pass through, strings are parsed.
    /// Non-finite results are rejected so callers fall back to their default.
    pub fn to_float(&self) -> Option<f64> {
        let value = match self {
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            other => other.as_number(),
        };
        value.filter(|v| v.is_finite())
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => n.as_f64().map_or(FieldValue::Null, FieldValue::Number),
            Value::String(s) => FieldValue::Text(s),
            nested @ (Value::Array(_) | Value::Object(_)) => FieldValue::Text(nested.to_string()),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// A mapping from field name to raw value. Field order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct InputRecord {
    fields: HashMap<String, FieldValue>,
}

impl InputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and programmatic callers.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the value of the first alias that is present and not null,
    /// scanning `aliases` in priority order.
    pub fn lookup(&self, aliases: &[&str]) -> Option<&FieldValue> {
        aliases
            .iter()
            .find_map(|alias| self.fields.get(*alias).filter(|v| !v.is_null()))
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for InputRecord {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
