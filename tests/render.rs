//! Tests for table and report rendering.

use gleaner::normalize::profile::FieldProfile;
use gleaner::normalize::{NormalizedRecord, ResponseNormalizer};
use gleaner::render;

fn records(profile: FieldProfile, raws: &[&str]) -> Vec<NormalizedRecord> {
    let normalizer = ResponseNormalizer::new(profile);
    raws.iter()
        .flat_map(|raw| normalizer.normalize(raw).into_records())
        .collect()
}

#[test]
fn columns_follow_profile_then_extras() {
    let recs = records(
        FieldProfile::triage(),
        &["Type: A | Owner: QA", "Type: B | Ticket: 12 | Owner: Ops"],
    );
    let columns = render::columns(&recs, &FieldProfile::triage());
    assert_eq!(columns, vec!["type", "status", "aspect", "action", "owner", "ticket"]);
}

#[test]
fn table_has_a_row_per_record_and_escapes_pipes() {
    let profile = FieldProfile::brand();
    let recs = records(
        profile.clone(),
        &[r#"[{"clothing_id":"1","sentiment":"Positive","summary":"a | b"},{"clothing_id":"2"}]"#],
    );
    let table = render::render_table(&recs, &profile);
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines[0], "| # | clothing_id | sentiment | key_issues | summary |");
    assert_eq!(lines[1], "|---|---|---|---|---|");
    assert_eq!(lines[2], "| 1 | 1 | Positive | — | a \\| b |");
    assert_eq!(lines[3], "| 2 | 2 | Unknown | — |  |");
    assert_eq!(lines.len(), 4);
}

#[test]
fn report_lists_every_item_with_labels() {
    let profile = FieldProfile::brand();
    let recs = records(
        profile.clone(),
        &[r#"{"analysis":[{"clothing_id":"1077","sentiment":"Negative","key_issues":["zipper","lining"],"summary":"Quality issues."}]}"#],
    );
    let report = render::render_report(&recs, &profile, "BRAND INTELLIGENCE REPORT");

    assert!(report.starts_with("BRAND INTELLIGENCE REPORT\nGenerated by gleaner\n"));
    assert!(report.contains("ITEM #1\n"));
    assert!(report.contains("ID:        1077\n"));
    assert!(report.contains("Sentiment: Negative\n"));
    assert!(report.contains("Issues:    zipper, lining\n"));
    assert!(report.contains("Summary:   Quality issues.\n"));
    assert!(report.trim_end().ends_with("----------------------------------------"));
}

#[test]
fn report_notes_diagnostic_records() {
    let profile = FieldProfile::triage();
    let recs = records(profile.clone(), &["unparseable"]);
    let report = render::render_report(&recs, &profile, "REPORT");
    assert!(report.contains("Status: Error\n"));
    assert!(report.contains("Note:"));
}

#[tokio::test]
async fn write_report_creates_parent_dirs() {
    let dir = std::env::temp_dir().join(format!("gleaner-report-{}", std::process::id()));
    let path = dir.join("nested").join("report.txt");
    let profile = FieldProfile::triage();
    let recs = records(profile.clone(), &["Type: A"]);

    render::write_report(&path, &recs, &profile, "REPORT").await.unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("Type:   A\n"));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn header_names_with_pipes_are_escaped() {
    let profile = FieldProfile::sentiment();
    let recs = records(profile.clone(), &[r#"{"label":"POSITIVE","score":0.5,"a|b":"x"}"#]);
    let table = render::render_table(&recs, &profile);
    let header = table.lines().next().unwrap();

    assert_eq!(header, "| # | label | score | a\\|b |");
}
