//! Tolerant parsing of model output into structured records.
//!
//! The remote endpoint forwards whatever a language model produced: plain
//! `Key: Value | Key: Value` text, fenced JSON, a label-prefixed answer, or
//! any of several JSON envelopes around those. [`ResponseNormalizer`] runs a
//! fixed chain of strategies over that text and always hands back a total
//! record (or collection of records) filled out with the profile's defaults.

pub mod clean;
pub mod envelope;
pub mod pipe;
pub mod profile;
pub mod record;
pub mod sentiment;

use serde_json::{Map, Value};

use crate::normalize::envelope::{Payload, unwrap_envelope};
use crate::normalize::profile::FieldProfile;
pub use crate::normalize::record::NormalizedRecord;

/// Deepest re-parse of JSON found inside model text.
const MAX_TEXT_DEPTH: usize = 4;

/// Result of normalizing one endpoint response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Single(NormalizedRecord),
    /// One record per batched item, in the order the model returned them.
    Collection(Vec<NormalizedRecord>),
}

impl Normalized {
    pub fn into_records(self) -> Vec<NormalizedRecord> {
        match self {
            Self::Single(record) => vec![record],
            Self::Collection(records) => records,
        }
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        match self {
            Self::Single(record) => std::slice::from_ref(record),
            Self::Collection(records) => records,
        }
    }

    pub fn is_diagnostic(&self) -> bool {
        matches!(self, Self::Single(record) if record.is_diagnostic())
    }
}

/// Turns raw endpoint output into [`Normalized`] records. Never fails.
#[derive(Debug, Clone)]
pub struct ResponseNormalizer {
    profile: FieldProfile,
    sentiment: FieldProfile,
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self::new(FieldProfile::default())
    }
}

impl ResponseNormalizer {
    pub fn new(profile: FieldProfile) -> Self {
        Self {
            profile,
            sentiment: FieldProfile::sentiment(),
        }
    }

    pub fn profile(&self) -> &FieldProfile {
        &self.profile
    }

    pub fn normalize(&self, raw: &str) -> Normalized {
        let payload = match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) => unwrap_envelope(value),
            Err(_) => Payload::Text(raw.to_string()),
        };
        self.resolve(payload, 0)
    }

    fn resolve(&self, payload: Payload, depth: usize) -> Normalized {
        match payload {
            Payload::Text(text) => self.resolve_text(&text, depth),
            Payload::Array(items) => self.resolve_array(items, depth),
            Payload::Object(map) => Normalized::Single(self.record_from_object(map)),
        }
    }

    fn resolve_text(&self, text: &str, depth: usize) -> Normalized {
        let cleaned = clean::clean(text);
        if cleaned.is_empty() {
            return self.diagnostic("model output was empty");
        }

        if depth < MAX_TEXT_DEPTH {
            match serde_json::from_str::<Value>(&cleaned) {
                Ok(value @ (Value::Array(_) | Value::Object(_) | Value::String(_))) => {
                    return self.resolve(unwrap_envelope(value), depth + 1);
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("model output is not JSON ({e}), trying key: value pairs"),
            }
        }

        let pairs = pipe::parse_pairs(&cleaned);
        if pairs.is_empty() {
            return self.diagnostic("no key: value pairs in model output");
        }
        Normalized::Single(self.profile.build_record(pairs))
    }

    fn resolve_array(&self, items: Vec<Value>, depth: usize) -> Normalized {
        if items.is_empty() {
            return self.diagnostic("model returned an empty list");
        }

        if sentiment::is_prediction_list(&items) {
            return match sentiment::top_prediction(&items) {
                Some(top) => Normalized::Single(
                    self.sentiment
                        .build_record(sentiment::prediction_pairs(top)),
                ),
                None => self.diagnostic("classifier returned no predictions"),
            };
        }

        let mut records = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Object(map) => records.push(self.record_from_object(map)),
                other if depth < MAX_TEXT_DEPTH => {
                    records.extend(self.resolve(unwrap_envelope(other), depth + 1).into_records());
                }
                _ => records.push(
                    self.profile
                        .diagnostic_record("list item nested too deeply"),
                ),
            }
        }
        Normalized::Collection(records)
    }

    fn record_from_object(&self, map: Map<String, Value>) -> NormalizedRecord {
        if sentiment::is_prediction_map(&map) {
            return self
                .sentiment
                .build_record(sentiment::prediction_pairs(&map));
        }

        let pairs: Vec<(String, String)> = map
            .iter()
            .filter_map(|(key, value)| {
                let key = pipe::clean_key(key);
                let text = value_text(value)?;
                (!key.is_empty()).then_some((key, text))
            })
            .collect();

        if pairs.is_empty() {
            return self
                .profile
                .diagnostic_record("model returned an object with no usable fields");
        }
        self.profile.build_record(pairs)
    }

    fn diagnostic(&self, reason: &str) -> Normalized {
        tracing::debug!(reason, "falling back to diagnostic record");
        Normalized::Single(self.profile.diagnostic_record(reason))
    }
}

/// String form of a JSON field value; `None` for null and empty values.
///
/// Arrays of scalars join with ", ", nested objects stay compact JSON.
fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(value_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    };
    (!text.is_empty()).then_some(text)
}
