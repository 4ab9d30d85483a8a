use std::path::Path;

use crate::error::GleanError;
use crate::normalize::NormalizedRecord;
use crate::normalize::profile::FieldProfile;

const RULE_HEAVY: &str = "========================================";
const RULE_LIGHT: &str = "----------------------------------------";

/// Profile fields in order, then extra keys in the order records first use them.
pub fn columns(records: &[NormalizedRecord], profile: &FieldProfile) -> Vec<String> {
    let mut columns: Vec<String> = profile.field_names().map(str::to_string).collect();
    for record in records {
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.to_string());
            }
        }
    }
    columns
}

/// Markdown table with one row per record. Missing cells render empty.
pub fn render_table(records: &[NormalizedRecord], profile: &FieldProfile) -> String {
    let columns = columns(records, profile);
    let mut out = String::new();

    let header: Vec<String> = columns.iter().map(|c| table_cell(c)).collect();
    out.push_str("| # | ");
    out.push_str(&header.join(" | "));
    out.push_str(" |\n|---|");
    for _ in &columns {
        out.push_str("---|");
    }
    out.push('\n');

    for (i, record) in records.iter().enumerate() {
        out.push_str(&format!("| {} |", i + 1));
        for column in &columns {
            let cell = record.get(column).map(table_cell).unwrap_or_default();
            out.push_str(&format!(" {cell} |"));
        }
        out.push('\n');
    }
    out
}

fn table_cell(value: &str) -> String {
    value
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

/// Plain-text report: a banner, then one block per record with aligned labels.
pub fn render_report(records: &[NormalizedRecord], profile: &FieldProfile, title: &str) -> String {
    let columns = columns(records, profile);
    let labels: Vec<String> = columns
        .iter()
        .map(|c| match profile.fields.iter().find(|f| f.name == *c) {
            Some(spec) => spec.display_label(),
            None => c.clone(),
        })
        .collect();
    let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 1;

    let mut report = format!("{title}\nGenerated by gleaner\n{RULE_HEAVY}\n\n");
    for (i, record) in records.iter().enumerate() {
        report.push_str(&format!("ITEM #{}\n", i + 1));
        for (column, label) in columns.iter().zip(&labels) {
            let Some(value) = record.get(column) else {
                continue;
            };
            let heading = format!("{label}:");
            report.push_str(&format!("{heading:<w$} {value}\n", w = width));
        }
        if let Some(reason) = record.diagnostic() {
            report.push_str(&format!("{:<w$} {reason}\n", "Note:", w = width));
        }
        report.push_str(RULE_LIGHT);
        report.push('\n');
    }
    report
}

/// Write the plain-text report to `path`, creating parent directories.
pub async fn write_report(
    path: &Path,
    records: &[NormalizedRecord],
    profile: &FieldProfile,
    title: &str,
) -> Result<(), GleanError> {
    let display = path.display().to_string();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| GleanError::FileWrite {
                path: parent.display().to_string(),
                source,
            })?;
    }
    tokio::fs::write(path, render_report(records, profile, title))
        .await
        .map_err(|source| GleanError::FileWrite {
            path: display,
            source,
        })
}
