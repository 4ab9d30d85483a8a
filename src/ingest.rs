use std::path::{Path, PathBuf};

use calamine::{DataType, Reader, open_workbook_auto};
use serde_json::Value;

use crate::error::GleanError;
use crate::normalize::envelope::COLLECTION_KEYS;

/// Files larger than this are refused before reading.
pub const MAX_FILE_BYTES: u64 = 20 * 1024 * 1024; // 20MB

/// Rows of text read from a feedback file, ready for batching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    /// Column header line, repeated at the top of every batch.
    pub header: Option<String>,
    pub rows: Vec<String>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// csv, tsv, txt and anything unrecognized: one row per line.
    Text,
    /// A JSON array; one row per element.
    Json,
    /// xlsx / xls / xlsb / ods; the first worksheet.
    Spreadsheet,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Self::Json,
            "xlsx" | "xls" | "xlsb" | "xlsm" | "ods" => Self::Spreadsheet,
            _ => Self::Text,
        }
    }
}

/// Read a feedback file into a [`Dataset`], picking the reader by extension.
pub async fn load_dataset(path: &Path) -> Result<Dataset, GleanError> {
    let display = path.display().to_string();
    let meta = tokio::fs::metadata(path).await.map_err(|source| GleanError::FileRead {
        path: display.clone(),
        source,
    })?;
    if !meta.is_file() {
        return Err(GleanError::Other(format!("{display} is not a regular file")));
    }
    if meta.len() > MAX_FILE_BYTES {
        return Err(GleanError::Other(format!(
            "{display} is too large: {} bytes (max {MAX_FILE_BYTES})",
            meta.len()
        )));
    }

    let format = FileFormat::from_path(path);
    tracing::debug!(path = %path.display(), ?format, "loading dataset");

    match format {
        FileFormat::Spreadsheet => {
            let owned: PathBuf = path.to_path_buf();
            tokio::task::spawn_blocking(move || read_spreadsheet(&owned))
                .await
                .map_err(|e| GleanError::Spreadsheet(format!("reader task failed: {e}")))?
        }
        FileFormat::Json | FileFormat::Text => {
            let bytes = tokio::fs::read(path).await.map_err(|source| GleanError::FileRead {
                path: display,
                source,
            })?;
            let text = String::from_utf8_lossy(&bytes);
            if format == FileFormat::Json {
                parse_json(&text)
            } else {
                parse_text(&text)
            }
        }
    }
}

/// Line-oriented text: blank lines dropped, first line is the header.
/// Line breaks inside a double-quoted CSV field stay part of their row.
pub fn parse_text(text: &str) -> Result<Dataset, GleanError> {
    let mut lines = csv_records(text)
        .into_iter()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| GleanError::InsufficientData("file is empty".to_string()))?;
    let rows: Vec<String> = lines.map(str::to_string).collect();
    if rows.is_empty() {
        return Err(GleanError::InsufficientData(
            "file has a header but no data rows".to_string(),
        ));
    }

    Ok(Dataset {
        header: Some(header.to_string()),
        rows,
    })
}

/// A JSON array (or an object wrapping one under a collection key); each
/// element becomes one compact-JSON row.
pub fn parse_json(text: &str) -> Result<Dataset, GleanError> {
    let value: Value = serde_json::from_str(text.trim())
        .map_err(|e| GleanError::UnsupportedFormat(format!("json file is not valid JSON: {e}")))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => COLLECTION_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| {
                GleanError::InsufficientData("json file holds no array of rows".to_string())
            })?,
        _ => {
            return Err(GleanError::InsufficientData(
                "json file holds no array of rows".to_string(),
            ));
        }
    };

    let rows: Vec<String> = items
        .iter()
        .filter(|v| !v.is_null())
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .filter(|r| !r.trim().is_empty())
        .collect();
    if rows.is_empty() {
        return Err(GleanError::InsufficientData(
            "json array is empty".to_string(),
        ));
    }

    Ok(Dataset { header: None, rows })
}

/// First worksheet as CSV lines, first non-empty line as the header.
fn read_spreadsheet(path: &Path) -> Result<Dataset, GleanError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| GleanError::Spreadsheet(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| GleanError::Spreadsheet("workbook has no worksheets".to_string()))?
        .map_err(|e| GleanError::Spreadsheet(e.to_string()))?;

    let lines: Vec<String> = range
        .rows()
        .filter(|row| row.iter().any(|cell| !matches!(cell, DataType::Empty)))
        .map(|row| {
            row.iter()
                .map(|cell| csv_field(&cell.to_string()))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect();

    parse_text(&lines.join("\n"))
}

/// Split on line breaks that are not inside a double-quoted field.
/// An escaped quote (`""`) toggles twice and leaves the state unchanged.
fn csv_records(text: &str) -> Vec<&str> {
    let mut records = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '\n' if !in_quotes => {
                records.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < text.len() {
        records.push(&text[start..]);
    }
    records
}

/// Quote a CSV field when it contains a separator, quote or line break.
pub fn csv_field(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
