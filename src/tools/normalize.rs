use schemars::JsonSchema;
use serde::Deserialize;

use crate::tools::enums::RecordFormat;

/// Largest raw model output accepted by the `normalize` tool.
pub const MAX_RAW_BYTES: usize = 2 * 1024 * 1024; // 2MB

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NormalizeRequest {
    /// Raw endpoint response body or model text: JSON envelope, fenced JSON, or `Key: Value | Key: Value` text.
    pub raw: String,
    /// Field profile to map onto (see `profiles`). Defaults to the configured profile.
    pub profile: Option<String>,
    /// "json" (default), "table" (markdown), or "pipe".
    pub format: Option<RecordFormat>,
}

impl NormalizeRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.raw.len() > MAX_RAW_BYTES {
            return Err(format!(
                "raw output too large: {} bytes (max {MAX_RAW_BYTES})",
                self.raw.len()
            ));
        }
        Ok(())
    }
}
