use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Response format for analysis results.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Summary plus the full markdown table of records.
    #[default]
    Detailed,
    /// Summary only (plus `report_file` when a report was written).
    Concise,
}

/// Output encoding for the `normalize` tool.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// JSON array of records.
    #[default]
    Json,
    /// Markdown table.
    Table,
    /// `key: value | key: value`, one record per line.
    Pipe,
}

impl RecordFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Table => "markdown",
            Self::Pipe => "text",
        }
    }
}
