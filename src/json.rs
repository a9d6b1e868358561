//! Conversion between [`Value`] and `serde_json::Value`.
//!
//! The JSON form is the crate's exchange format: query arguments arrive as
//! JSON, results leave as JSON, and defaults in operator signatures are
//! stored as JSON literals. Conversion is total in both directions, with
//! one caveat: non-finite doubles have no JSON representation and map to
//! `null`.

use std::collections::HashMap;

use serde_json::Number;

use crate::value::Value;

/// Builds a [`Value`] from parsed JSON.
///
/// Whole JSON numbers that fit `i64` become `Int`; everything else numeric
/// becomes `Double`.
pub fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::list(items.iter().map(from_json).collect()),
        serde_json::Value::Object(entries) => {
            let map: HashMap<String, Value> = entries
                .iter()
                .map(|(k, v)| (k.clone(), from_json(v)))
                .collect();
            Value::dict(map)
        }
    }
}

/// Renders a [`Value`] as JSON.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Nil => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => serde_json::Value::Number(Number::from(*n)),
        Value::Double(n) => match Number::from_f64(*n) {
            Some(number) => serde_json::Value::Number(number),
            // NaN and infinities are unrepresentable in JSON
            None => serde_json::Value::Null,
        },
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::List(items) => {
            serde_json::Value::Array(items.borrow().iter().map(to_json).collect())
        }
        Value::Dict(entries) => {
            let map: serde_json::Map<String, serde_json::Value> = entries
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}
