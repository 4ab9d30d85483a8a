use serde_json::{Map, Value};

use crate::normalize::sentiment;

/// Object fields whose array value is a collection of per-item records.
pub const COLLECTION_KEYS: &[&str] = &["analysis", "results", "items", "records"];

/// Deepest envelope nesting followed before the value is taken as-is.
pub const MAX_ENVELOPE_DEPTH: usize = 8;

/// What is left once every envelope has been peeled off.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Model text still to be cleaned and parsed.
    Text(String),
    /// A list of per-item values (usually objects).
    Array(Vec<Value>),
    /// An object with no envelope field; read as a single record.
    Object(Map<String, Value>),
}

/// Peel response envelopes off a parsed JSON value.
///
/// Checked in order: `.output`, `.response`, `choices[0].message.content`,
/// a top-level array, an array under a collection key, else the value itself.
/// `[[...]]` uses its first inner list when that list holds classifier
/// predictions, otherwise the first element of that list.
pub fn unwrap_envelope(value: Value) -> Payload {
    unwrap_at(value, 0)
}

fn unwrap_at(value: Value, depth: usize) -> Payload {
    if depth >= MAX_ENVELOPE_DEPTH {
        tracing::warn!(depth, "envelope nesting too deep, using value as-is");
        return as_payload(value);
    }

    match value {
        Value::Object(mut map) => {
            for key in ["output", "response"] {
                if let Some(inner) = map.remove(key).filter(|v| !v.is_null()) {
                    return unwrap_at(inner, depth + 1);
                }
            }

            if let Some(content) = map
                .get("choices")
                .and_then(|c| c.pointer("/0/message/content"))
                .filter(|v| !v.is_null())
                .cloned()
            {
                return unwrap_at(content, depth + 1);
            }

            for key in COLLECTION_KEYS {
                if map.get(*key).is_some_and(Value::is_array)
                    && let Some(items) = map.remove(*key)
                {
                    return unwrap_at(items, depth + 1);
                }
            }

            Payload::Object(map)
        }
        Value::Array(items) => {
            if !matches!(items.first(), Some(Value::Array(_))) {
                return Payload::Array(items);
            }
            match items.into_iter().next() {
                Some(Value::Array(inner)) if sentiment::is_prediction_list(&inner) => {
                    Payload::Array(inner)
                }
                Some(Value::Array(inner)) => match inner.into_iter().next() {
                    Some(first) => unwrap_at(first, depth + 1),
                    None => Payload::Array(Vec::new()),
                },
                _ => Payload::Array(Vec::new()),
            }
        }
        other => as_payload(other),
    }
}

fn as_payload(value: Value) -> Payload {
    match value {
        Value::String(s) => Payload::Text(s),
        Value::Array(items) => Payload::Array(items),
        Value::Object(map) => Payload::Object(map),
        other => Payload::Text(other.to_string()),
    }
}
