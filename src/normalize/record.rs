use serde::ser::{Serialize, SerializeMap, Serializer};

/// A total, ordered set of `field -> value` pairs produced by the normalizer.
///
/// Keys are lowercase. Canonical fields of the profile come first, in profile
/// order; any extra keys the model emitted follow in the order they were seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    fields: Vec<(String, String)>,
    diagnostic: Option<String>,
}

impl NormalizedRecord {
    pub(crate) fn from_fields(fields: Vec<(String, String)>) -> Self {
        Self {
            fields,
            diagnostic: None,
        }
    }

    pub(crate) fn with_diagnostic(mut self, reason: impl Into<String>) -> Self {
        self.diagnostic = Some(reason.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.trim().to_lowercase();
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert a field only when the record does not already carry it.
    pub fn insert_if_absent(&mut self, key: &str, value: impl Into<String>) {
        let key = key.trim().to_lowercase();
        if !self.fields.iter().any(|(k, _)| *k == key) {
            self.fields.push((key, value.into()));
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Why nothing could be parsed, for records built from unusable output.
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    pub fn is_diagnostic(&self) -> bool {
        self.diagnostic.is_some()
    }

    /// `key: value | key: value` form. Normalizing this string yields the same
    /// fields, as long as no value contains a pipe or a line break.
    pub fn to_pipe_string(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl Serialize for NormalizedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(self.diagnostic.is_some());
        let mut map = serializer.serialize_map(Some(self.fields.len() + extra))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        if let Some(ref reason) = self.diagnostic {
            map.serialize_entry("diagnostic", reason)?;
        }
        map.end()
    }
}
