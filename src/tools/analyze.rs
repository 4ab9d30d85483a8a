use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisOutcome, BatchFailure};
use crate::batch::BatchMode;
use crate::tools::enums::ResponseFormat;

/// Upper bound on `batch_size` from a tool call.
pub const MAX_BATCH_SIZE: usize = 500;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AnalyzeRequest {
    /// Path of the feedback file: .csv, .txt, .tsv, .json, .xlsx, .xls or .ods.
    pub file_path: String,
    /// Field profile to map results onto (see `profiles`). Defaults to the configured profile.
    pub profile: Option<String>,
    /// "batch" (header + N rows per request, default) or "per_row" (one request per row).
    pub mode: Option<BatchMode>,
    /// Rows per request in batch mode (default from config, usually 50).
    pub batch_size: Option<usize>,
    /// Total rows to send; 0 sends every row (default from config, usually 50).
    pub max_rows: Option<usize>,
    /// Where to write the plain-text report. Omit to skip the report.
    pub report_path: Option<String>,
    /// Report heading (default from config).
    pub report_title: Option<String>,
    /// "detailed" (default): summary + table. "concise": summary only.
    pub response_format: Option<ResponseFormat>,
}

impl AnalyzeRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.file_path.trim().is_empty() {
            return Err("file_path must not be empty".to_string());
        }
        if let Some(size) = self.batch_size
            && !(1..=MAX_BATCH_SIZE).contains(&size)
        {
            return Err(format!("batch_size must be between 1 and {MAX_BATCH_SIZE}"));
        }
        Ok(())
    }
}

/// Run statistics placed at the top of the `analyze` response.
#[derive(Debug, Serialize)]
pub struct AnalyzeSummary {
    pub file: String,
    pub mode: &'static str,
    pub rows_read: usize,
    pub rows_sent: usize,
    pub batches_sent: usize,
    pub records: usize,
    pub unparsed_responses: usize,
    pub failures: Vec<BatchFailure>,
    pub elapsed_ms: u64,
}

impl AnalyzeSummary {
    pub fn new(file: String, mode: BatchMode, rows_read: usize, outcome: &AnalysisOutcome) -> Self {
        Self {
            file,
            mode: mode.as_str(),
            rows_read,
            rows_sent: outcome.rows_sent,
            batches_sent: outcome.batches_sent,
            records: outcome.records.len(),
            unparsed_responses: outcome.unparsed_responses,
            failures: outcome.failures.clone(),
            elapsed_ms: outcome.elapsed_ms,
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "**{}**: {} of {} rows sent in {} {} batch(es), {} record(s), {:.1}s",
            self.file,
            self.rows_sent,
            self.rows_read,
            self.batches_sent,
            self.mode,
            self.records,
            self.elapsed_ms as f64 / 1000.0
        );
        if self.unparsed_responses > 0 {
            out.push_str(&format!(
                "\n- {} response(s) had no usable fields",
                self.unparsed_responses
            ));
        }
        for failure in &self.failures {
            out.push_str(&format!(
                "\n- batch {} (rows {}-{}) failed: {}",
                failure.batch + 1,
                failure.first_row + 1,
                failure.first_row + failure.row_count,
                failure.error
            ));
        }
        out
    }
}
