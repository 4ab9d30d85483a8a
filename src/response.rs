use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

/// JSON envelope every tool returns as its single text content item.
#[derive(Debug, Serialize)]
pub struct ToolResponse {
    pub status: &'static str,
    pub content: String,
    pub content_type: &'static str,
    pub metadata: ToolMetadata,
}

#[derive(Debug, Serialize, Default)]
pub struct ToolMetadata {
    pub tool_name: String,
    pub profile: String,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_batches: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_file: Option<String>,
    #[serde(serialize_with = "finite_seconds")]
    pub duration_seconds: f64,
}

/// JSON has no NaN or infinity; such durations are written as zero.
fn finite_seconds<S: serde::Serializer>(secs: &f64, s: S) -> Result<S::Ok, S::Error> {
    let secs = if secs.is_finite() { *secs } else { 0.0 };
    s.serialize_f64(secs)
}

impl ToolResponse {
    pub fn success(content: String, content_type: &'static str, metadata: ToolMetadata) -> Self {
        Self {
            status: "success",
            content,
            content_type,
            metadata,
        }
    }

    /// Some batches failed but records were still produced for every batch.
    pub fn partial(content: String, content_type: &'static str, metadata: ToolMetadata) -> Self {
        Self {
            status: "partial",
            content,
            content_type,
            metadata,
        }
    }

    pub fn error(message: String, metadata: ToolMetadata) -> Self {
        Self {
            status: "error",
            content: message,
            content_type: "text",
            metadata,
        }
    }

    /// Wrap the envelope as the tool's only text content. The MCP result is
    /// never flagged as an error; a failed `analyze` still has a summary and
    /// records worth reading, and `status` tells the caller how it went.
    pub fn into_call_tool_result(self) -> CallToolResult {
        let json = serde_json::to_string(&self).unwrap_or_else(|e| {
            serde_json::json!({
                "status": "error",
                "content": format!("could not encode tool response: {e}"),
                "content_type": "text",
                "metadata": { "tool_name": self.metadata.tool_name },
            })
            .to_string()
        });
        CallToolResult::success(vec![Content::text(json)])
    }
}
