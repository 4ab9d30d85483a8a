use serde::{Deserialize, Serialize};

use crate::error::GleanError;
use crate::normalize::record::NormalizedRecord;

/// Names of the profiles compiled into the binary.
pub const BUILTIN_PROFILES: &[&str] = &["triage", "inspection", "brand", "sentiment"];

pub const DEFAULT_PROFILE: &str = "triage";

fn default_diagnostic_value() -> String {
    "Error".to_string()
}

/// One canonical output field and the value it takes when the model omits it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub default: String,
    /// Alternative spellings the model uses for this field (e.g. "issues" for "key_issues").
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Heading used in the plain-text report. Derived from `name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FieldSpec {
    fn new(name: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            default: default.to_string(),
            aliases: Vec::new(),
            label: None,
        }
    }

    fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    /// Report heading: explicit label, or the name with underscores as spaces
    /// and the first letter capitalized.
    pub fn display_label(&self) -> String {
        if let Some(ref label) = self.label {
            return label.clone();
        }
        let spaced = self.name.replace('_', " ");
        let mut chars = spaced.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    fn matches(&self, key: &str) -> bool {
        let key = match_form(key);
        match_form(&self.name) == key || self.aliases.iter().any(|a| match_form(a) == key)
    }
}

/// The canonical field set a deployment expects back from the model, with
/// the default applied to each absent field and the field that carries the
/// diagnostic marker when nothing could be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldProfile {
    pub name: String,
    pub fields: Vec<FieldSpec>,
    pub diagnostic_field: String,
    #[serde(default = "default_diagnostic_value")]
    pub diagnostic_value: String,
}

impl Default for FieldProfile {
    fn default() -> Self {
        Self::triage()
    }
}

impl FieldProfile {
    /// Issue triage: what kind of feedback, what state it is in, what to do.
    pub fn triage() -> Self {
        Self {
            name: "triage".to_string(),
            fields: vec![
                FieldSpec::new("type", "General").with_aliases(&["category", "kind"]),
                FieldSpec::new("status", "Review Needed"),
                FieldSpec::new("aspect", "General").with_aliases(&["area", "topic"]),
                FieldSpec::new("action", "none").with_aliases(&["next_step", "recommendation"]),
            ],
            diagnostic_field: "status".to_string(),
            diagnostic_value: default_diagnostic_value(),
        }
    }

    /// Triage plus a visual-inspection note, for image-backed feedback.
    pub fn inspection() -> Self {
        let mut profile = Self::triage();
        profile.name = "inspection".to_string();
        profile.fields.push(FieldSpec::new("visual", "none"));
        profile
    }

    /// Per-product brand intelligence, one record per clothing item.
    pub fn brand() -> Self {
        Self {
            name: "brand".to_string(),
            fields: vec![
                FieldSpec::new("clothing_id", "N/A")
                    .with_aliases(&["id", "product_id"])
                    .with_label("ID"),
                FieldSpec::new("sentiment", "Unknown"),
                FieldSpec::new("key_issues", "—")
                    .with_aliases(&["issues"])
                    .with_label("Issues"),
                FieldSpec::new("summary", ""),
            ],
            diagnostic_field: "sentiment".to_string(),
            diagnostic_value: default_diagnostic_value(),
        }
    }

    /// Classifier output (`label` + `score`).
    pub fn sentiment() -> Self {
        Self {
            name: "sentiment".to_string(),
            fields: vec![
                FieldSpec::new("label", "UNKNOWN"),
                FieldSpec::new("score", "N/A").with_aliases(&["confidence"]),
            ],
            diagnostic_field: "label".to_string(),
            diagnostic_value: default_diagnostic_value(),
        }
    }

    pub fn builtin(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "triage" => Some(Self::triage()),
            "inspection" => Some(Self::inspection()),
            "brand" => Some(Self::brand()),
            "sentiment" => Some(Self::sentiment()),
            _ => None,
        }
    }

    /// Lowercase field names and check the diagnostic field is one of them.
    pub fn validated(mut self) -> Result<Self, GleanError> {
        if self.fields.is_empty() {
            return Err(GleanError::Config(format!(
                "profile '{}' declares no fields",
                self.name
            )));
        }
        for field in &mut self.fields {
            field.name = field.name.trim().to_lowercase();
            if field.name.is_empty() {
                return Err(GleanError::Config(format!(
                    "profile '{}' has a field with an empty name",
                    self.name
                )));
            }
        }
        self.diagnostic_field = self.diagnostic_field.trim().to_lowercase();
        if !self.fields.iter().any(|f| f.name == self.diagnostic_field) {
            return Err(GleanError::Config(format!(
                "profile '{}': diagnostic_field '{}' is not one of its fields",
                self.name, self.diagnostic_field
            )));
        }
        Ok(self)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Canonical name for a working key, if it names (or aliases) a profile field.
    pub fn canonical_name(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.matches(key))
            .map(|f| f.name.as_str())
    }

    /// Map working key/value pairs onto the canonical field set.
    ///
    /// Canonical fields come first in profile order, each either parsed or
    /// defaulted. Unrecognized keys follow in first-seen order. A key seen
    /// twice keeps its last value.
    pub fn build_record(&self, pairs: Vec<(String, String)>) -> NormalizedRecord {
        let mut canonical: Vec<Option<String>> = vec![None; self.fields.len()];
        let mut extras: Vec<(String, String)> = Vec::new();

        for (key, value) in pairs {
            match self.fields.iter().position(|f| f.matches(&key)) {
                Some(idx) => canonical[idx] = Some(value),
                None => match extras.iter_mut().find(|(k, _)| *k == key) {
                    Some(slot) => slot.1 = value,
                    None => extras.push((key, value)),
                },
            }
        }

        let mut fields: Vec<(String, String)> = self
            .fields
            .iter()
            .zip(canonical)
            .map(|(spec, parsed)| {
                (
                    spec.name.clone(),
                    parsed.unwrap_or_else(|| spec.default.clone()),
                )
            })
            .collect();
        fields.extend(extras);

        NormalizedRecord::from_fields(fields)
    }

    /// All defaults, with the diagnostic field set to the diagnostic value.
    pub fn diagnostic_record(&self, reason: impl Into<String>) -> NormalizedRecord {
        let fields = self
            .fields
            .iter()
            .map(|spec| {
                let value = if spec.name == self.diagnostic_field {
                    self.diagnostic_value.clone()
                } else {
                    spec.default.clone()
                };
                (spec.name.clone(), value)
            })
            .collect();
        NormalizedRecord::from_fields(fields).with_diagnostic(reason)
    }
}

/// Comparison form of a key: lowercase, trimmed, spaces and hyphens as underscores.
fn match_form(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}
