use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ingest::Dataset;

/// Rows per request when nothing else is configured.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Rows sent in total when nothing else is configured. Larger inputs run
/// into the endpoint's token and time limits.
pub const DEFAULT_MAX_ROWS: usize = 50;

/// How rows are grouped into endpoint requests.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// Header plus up to `batch_size` rows per request; the model answers
    /// with one record per item.
    #[default]
    Batch,
    /// One request per row; the model answers with a single record.
    PerRow,
}

impl BatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Batch => "batch",
            Self::PerRow => "per_row",
        }
    }
}

/// One endpoint request worth of rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub index: usize,
    /// Position of the first row in the dataset.
    pub first_row: usize,
    pub row_count: usize,
    /// Text posted to the endpoint.
    pub text: String,
}

/// Split a dataset into batches, capped at `max_rows` rows overall.
pub fn plan_batches(
    dataset: &Dataset,
    mode: BatchMode,
    batch_size: usize,
    max_rows: Option<usize>,
) -> Vec<Batch> {
    let limit = max_rows.unwrap_or(usize::MAX).min(dataset.rows.len());
    let rows = &dataset.rows[..limit];
    if limit < dataset.rows.len() {
        tracing::info!(
            sent = limit,
            total = dataset.rows.len(),
            "row cap reached, remaining rows skipped"
        );
    }

    let chunk = match mode {
        BatchMode::PerRow => 1,
        BatchMode::Batch => batch_size.max(1),
    };

    rows.chunks(chunk)
        .enumerate()
        .map(|(index, chunk_rows)| {
            let body = chunk_rows.join("\n");
            let text = match (mode, &dataset.header) {
                (BatchMode::Batch, Some(header)) => format!("{header}\n{body}"),
                _ => body,
            };
            Batch {
                index,
                first_row: index * chunk,
                row_count: chunk_rows.len(),
                text,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(rows: usize) -> Dataset {
        Dataset {
            header: Some("id,review".to_string()),
            rows: (0..rows).map(|i| format!("{i},text {i}")).collect(),
        }
    }

    #[test]
    fn batches_repeat_the_header() {
        let batches = plan_batches(&dataset(5), BatchMode::Batch, 2, None);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].text, "id,review\n0,text 0\n1,text 1");
        assert_eq!(batches[2].text, "id,review\n4,text 4");
        assert_eq!(batches[2].first_row, 4);
        assert_eq!(batches[2].row_count, 1);
    }

    #[test]
    fn per_row_sends_bare_rows() {
        let batches = plan_batches(&dataset(3), BatchMode::PerRow, 50, None);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[1].text, "1,text 1");
        assert_eq!(batches[1].first_row, 1);
    }

    #[test]
    fn row_cap_limits_total_rows() {
        let batches = plan_batches(&dataset(120), BatchMode::Batch, 20, Some(DEFAULT_MAX_ROWS));
        let sent: usize = batches.iter().map(|b| b.row_count).sum();
        assert_eq!(sent, 50);
        assert_eq!(batches.len(), 3);
    }

    #[test]
    fn zero_batch_size_is_treated_as_one() {
        let batches = plan_batches(&dataset(2), BatchMode::Batch, 0, None);
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn headerless_batches_are_bare() {
        let data = Dataset {
            header: None,
            rows: vec!["{\"a\":1}".to_string(), "{\"a\":2}".to_string()],
        };
        let batches = plan_batches(&data, BatchMode::Batch, 10, None);
        assert_eq!(batches[0].text, "{\"a\":1}\n{\"a\":2}");
    }
}
