pub mod http;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Name of the JSON field the endpoint reads the input text from.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKey {
    /// `{"text": "..."}`
    #[default]
    Text,
    /// `{"data": "..."}`
    Data,
}

impl PayloadKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Data => "data",
        }
    }
}

/// Internal request type for one endpoint call.
pub struct EndpointRequest {
    pub text: String,
    /// Batch position, for log correlation only.
    pub batch_index: usize,
}

/// Raw body returned by the endpoint, before normalization.
#[derive(Debug)]
pub struct EndpointResponse {
    pub body: String,
    pub status: u16,
    pub latency_ms: u64,
}
