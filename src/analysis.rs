use std::time::Instant;

use serde::Serialize;

use crate::batch::{Batch, BatchMode, plan_batches};
use crate::dispatch::EndpointRequest;
use crate::dispatch::http::EndpointClient;
use crate::ingest::Dataset;
use crate::normalize::{NormalizedRecord, ResponseNormalizer};

/// Field that carries the source row in per-row mode.
pub const INPUT_FIELD: &str = "input";

/// Batch parameters for one analysis run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub mode: BatchMode,
    pub batch_size: usize,
    pub max_rows: Option<usize>,
}

/// A batch whose endpoint call failed; its rows got a diagnostic record.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub batch: usize,
    pub first_row: usize,
    pub row_count: usize,
    pub error: String,
}

/// Everything one run produced. Owned by the caller; nothing is kept between runs.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOutcome {
    pub records: Vec<NormalizedRecord>,
    pub batches_sent: usize,
    pub rows_sent: usize,
    pub failures: Vec<BatchFailure>,
    /// Responses that parsed to nothing usable.
    pub unparsed_responses: usize,
    pub elapsed_ms: u64,
}

impl AnalysisOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.unparsed_responses == 0
    }
}

/// Sends batches to the endpoint one at a time and normalizes each answer.
pub struct Analyzer<'a> {
    client: &'a EndpointClient,
    normalizer: &'a ResponseNormalizer,
}

impl<'a> Analyzer<'a> {
    pub fn new(client: &'a EndpointClient, normalizer: &'a ResponseNormalizer) -> Self {
        Self { client, normalizer }
    }

    /// Run every batch in order. A failed endpoint call adds a diagnostic
    /// record for that batch and the run continues with the next one.
    pub async fn run(&self, dataset: &Dataset, options: RunOptions) -> AnalysisOutcome {
        let start = Instant::now();
        let batches = plan_batches(dataset, options.mode, options.batch_size, options.max_rows);
        let total = batches.len();
        let mut outcome = AnalysisOutcome::default();

        for batch in &batches {
            tracing::info!(
                batch = batch.index + 1,
                total,
                rows = batch.row_count,
                "sending batch to analysis endpoint"
            );
            outcome.batches_sent += 1;
            outcome.rows_sent += batch.row_count;
            self.run_batch(batch, options.mode, dataset, &mut outcome).await;
        }

        outcome.elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            records = outcome.records.len(),
            failures = outcome.failures.len(),
            elapsed_ms = outcome.elapsed_ms,
            "analysis complete"
        );
        outcome
    }

    async fn run_batch(
        &self,
        batch: &Batch,
        mode: BatchMode,
        dataset: &Dataset,
        outcome: &mut AnalysisOutcome,
    ) {
        let req = EndpointRequest {
            text: batch.text.clone(),
            batch_index: batch.index,
        };

        let mut records = match self.client.send(&req).await {
            Ok(response) => {
                tracing::debug!(
                    batch = batch.index + 1,
                    status = response.status,
                    latency_ms = response.latency_ms,
                    "endpoint responded"
                );
                let normalized = self.normalizer.normalize(&response.body);
                if normalized.is_diagnostic() {
                    outcome.unparsed_responses += 1;
                    tracing::warn!(
                        batch = batch.index + 1,
                        "endpoint response had no usable fields"
                    );
                }
                normalized.into_records()
            }
            Err(e) => {
                tracing::warn!(
                    batch = batch.index + 1,
                    endpoint = ?e.endpoint(),
                    "endpoint call failed: {e}"
                );
                let message = e.user_message();
                outcome.failures.push(BatchFailure {
                    batch: batch.index,
                    first_row: batch.first_row,
                    row_count: batch.row_count,
                    error: message.clone(),
                });
                vec![self.normalizer.profile().diagnostic_record(message)]
            }
        };

        if mode == BatchMode::PerRow
            && let (Some(record), Some(row)) =
                (records.first_mut(), dataset.rows.get(batch.first_row))
        {
            record.insert_if_absent(INPUT_FIELD, row.clone());
        }
        outcome.records.append(&mut records);
    }
}
