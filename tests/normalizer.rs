//! Tests for the response normalizer: envelopes, cleanup, pipe parsing,
//! defaults, classifier output, and diagnostic fallbacks.

use gleaner::normalize::profile::FieldProfile;
use gleaner::normalize::{Normalized, NormalizedRecord, ResponseNormalizer};

fn triage() -> ResponseNormalizer {
    ResponseNormalizer::new(FieldProfile::triage())
}

fn brand() -> ResponseNormalizer {
    ResponseNormalizer::new(FieldProfile::brand())
}

fn single(normalized: Normalized) -> NormalizedRecord {
    match normalized {
        Normalized::Single(record) => record,
        Normalized::Collection(records) => panic!("expected one record, got {}", records.len()),
    }
}

fn pairs(record: &NormalizedRecord) -> Vec<(String, String)> {
    record
        .fields()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Pipe/colon text
// ---------------------------------------------------------------------------

#[test]
fn well_formed_pipe_text_fills_every_field() {
    let record = single(triage().normalize("Type: A | Status: B | Aspect: C | Action: D"));

    assert_eq!(
        pairs(&record),
        vec![
            ("type".to_string(), "A".to_string()),
            ("status".to_string(), "B".to_string()),
            ("aspect".to_string(), "C".to_string()),
            ("action".to_string(), "D".to_string()),
        ]
    );
    assert!(!record.is_diagnostic());
}

#[test]
fn missing_fields_take_their_defaults() {
    let record = single(triage().normalize("Type: Defect | Action: Refund"));

    assert_eq!(record.get("type"), Some("Defect"));
    assert_eq!(record.get("action"), Some("Refund"));
    assert_eq!(record.get("status"), Some("Review Needed"));
    assert_eq!(record.get("aspect"), Some("General"));
    assert!(!record.is_diagnostic());
}

#[test]
fn keys_are_case_insensitive_and_values_keep_case() {
    let record = single(triage().normalize("  TYPE  :  Sizing Issue |sTaTuS:OPEN"));

    assert_eq!(record.get("type"), Some("Sizing Issue"));
    assert_eq!(record.get("status"), Some("OPEN"));
}

#[test]
fn unrecognized_keys_are_preserved_lowercase() {
    let record = single(triage().normalize("Type: A | Colour Note : Faded after wash"));

    assert_eq!(record.get("colour note"), Some("Faded after wash"));
    let keys: Vec<&str> = record.keys().collect();
    assert_eq!(keys, vec!["type", "status", "aspect", "action", "colour note"]);
}

#[test]
fn aliases_map_onto_canonical_fields() {
    let record = single(brand().normalize("ID: 1077 | Issues: zipper, lining | Sentiment: Mixed"));

    assert_eq!(record.get("clothing_id"), Some("1077"));
    assert_eq!(record.get("key_issues"), Some("zipper, lining"));
    assert_eq!(record.get("sentiment"), Some("Mixed"));
    assert_eq!(record.get("summary"), Some(""));
}

#[test]
fn line_separated_pairs_are_read_like_pipes() {
    let record = single(triage().normalize("**Type:** Quality\n**Status:** Open\n"));

    assert_eq!(record.get("type"), Some("Quality"));
    assert_eq!(record.get("status"), Some("Open"));
}

// ---------------------------------------------------------------------------
// Fences and prefixes
// ---------------------------------------------------------------------------

#[test]
fn fenced_text_has_no_fence_markers() {
    let record = single(triage().normalize("```\nType: A | Status: B\n```"));

    for (_, value) in record.fields() {
        assert!(!value.contains("```"), "fence leaked into {value:?}");
    }
    assert_eq!(record.get("status"), Some("B"));
}

#[test]
fn fenced_json_is_parsed() {
    let raw = "```json\n{\"type\": \"Fit\", \"status\": \"Open\"}\n```";
    let record = single(triage().normalize(raw));

    assert_eq!(record.get("type"), Some("Fit"));
    assert_eq!(record.get("status"), Some("Open"));
}

#[test]
fn leading_label_prefix_is_removed() {
    let record = single(triage().normalize("Result: Type: A | Status: B"));
    assert_eq!(record.get("type"), Some("A"));

    let record = single(triage().normalize("analysis: Type: Damage | Status: Closed"));
    assert_eq!(record.get("type"), Some("Damage"));
}

#[test]
fn prefix_inside_a_fence_is_removed() {
    let record = single(triage().normalize("```\nOutput: Type: A\n```"));
    assert_eq!(record.get("type"), Some("A"));
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

#[test]
fn output_envelope_with_pipe_text() {
    let record = single(triage().normalize(r#"{"output": "Type: A | Status: B"}"#));
    assert_eq!(record.get("type"), Some("A"));
}

#[test]
fn response_envelope() {
    let record = single(triage().normalize(r#"{"response": "Result: Type: Billing"}"#));
    assert_eq!(record.get("type"), Some("Billing"));
}

#[test]
fn chat_completion_envelope_with_fenced_json_inside() {
    let raw = r#"{"choices":[{"message":{"role":"assistant","content":"```json\n[{\"type\":\"A\"},{\"type\":\"B\"}]\n```"}}]}"#;
    let records = triage().normalize(raw).into_records();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("type"), Some("A"));
    assert_eq!(records[1].get("type"), Some("B"));
    assert_eq!(records[1].get("status"), Some("Review Needed"));
}

#[test]
fn analysis_array_envelope_unwraps_to_collection() {
    let raw = r#"{"analysis":[{"clothing_id":"A1","sentiment":"Positive"}]}"#;
    let Normalized::Collection(records) = brand().normalize(raw) else {
        panic!("expected a collection");
    };

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("clothing_id"), Some("A1"));
    assert_eq!(records[0].get("sentiment"), Some("Positive"));
    assert_eq!(records[0].get("key_issues"), Some("—"));
}

#[test]
fn output_string_holding_a_batch_array() {
    let raw = r#"{"output": "```json\n[{\"clothing_id\": \"1049\", \"sentiment\": \"Negative\", \"key_issues\": [\"runs small\", \"thin fabric\"], \"summary\": \"Sizing complaints.\"}]\n```"}"#;
    let records = brand().normalize(raw).into_records();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("clothing_id"), Some("1049"));
    assert_eq!(records[0].get("key_issues"), Some("runs small, thin fabric"));
    assert_eq!(records[0].get("summary"), Some("Sizing complaints."));
}

#[test]
fn collection_order_is_preserved() {
    let raw = r#"[{"clothing_id":"3"},{"clothing_id":"1"},{"clothing_id":"2"}]"#;
    let ids: Vec<String> = brand()
        .normalize(raw)
        .into_records()
        .iter()
        .map(|r| r.get("clothing_id").unwrap_or_default().to_string())
        .collect();
    assert_eq!(ids, vec!["3", "1", "2"]);
}

#[test]
fn plain_json_object_is_a_single_record() {
    let record = single(triage().normalize(r#"{"Type": "Delivery", "Visual": "box crushed"}"#));

    assert_eq!(record.get("type"), Some("Delivery"));
    assert_eq!(record.get("visual"), Some("box crushed"));
    assert_eq!(record.get("status"), Some("Review Needed"));
}

#[test]
fn null_fields_are_defaulted() {
    let record = single(triage().normalize(r#"{"type": null, "status": "Open"}"#));
    assert_eq!(record.get("type"), Some("General"));
    assert_eq!(record.get("status"), Some("Open"));
}

// ---------------------------------------------------------------------------
// Classifier output
// ---------------------------------------------------------------------------

#[test]
fn label_score_list_maps_to_sentiment() {
    let record = single(triage().normalize(r#"[{"label":"LABEL_1","score":0.873}]"#));

    assert_eq!(record.get("label"), Some("POSITIVE"));
    assert_eq!(record.get("score"), Some("87.3%"));
}

#[test]
fn nested_classifier_list_takes_top_prediction() {
    let raw = r#"[[{"label":"LABEL_0","score":0.1},{"label":"LABEL_1","score":0.9}]]"#;
    let record = single(triage().normalize(raw));

    assert_eq!(record.get("label"), Some("POSITIVE"));
    assert_eq!(record.get("score"), Some("90.0%"));
}

#[test]
fn non_numeric_score_is_kept_as_text() {
    let normalizer = ResponseNormalizer::new(FieldProfile::sentiment());
    let record = single(normalizer.normalize(r#"[{"label":"POSITIVE","score":"high"}]"#));

    assert_eq!(record.get("label"), Some("POSITIVE"));
    assert_eq!(record.get("score"), Some("high"));
}

#[test]
fn label_only_object_is_an_ordinary_record() {
    let record = single(triage().normalize(r#"{"label":"Sizing"}"#));

    assert_eq!(record.get("label"), Some("Sizing"));
    assert_eq!(record.get("type"), Some("General"));
}

#[test]
fn unlabeled_prediction_is_unknown() {
    let record = single(triage().normalize(r#"[{"score":0.5}]"#));
    assert_eq!(record.get("label"), Some("UNKNOWN"));
    assert_eq!(record.get("score"), Some("50.0%"));
}

#[test]
fn unmapped_label_is_uppercased() {
    let record = single(triage().normalize(r#"{"output": [{"label":"neutral","score":0.61}]}"#));
    assert_eq!(record.get("label"), Some("NEUTRAL"));
}

// ---------------------------------------------------------------------------
// Diagnostic fallbacks
// ---------------------------------------------------------------------------

#[test]
fn garbage_text_yields_diagnostic_record() {
    let record = single(triage().normalize("garbage text with no delimiters"));

    assert!(record.is_diagnostic());
    assert_eq!(record.get("status"), Some("Error"));
    assert_eq!(record.get("type"), Some("General"));
    assert_eq!(record.get("aspect"), Some("General"));
    assert_eq!(record.get("action"), Some("none"));
    assert_eq!(record.len(), 4);
}

#[test]
fn empty_and_whitespace_output_is_diagnostic() {
    for raw in ["", "   ", "```\n```", r#"{"output": ""}"#, "Result:"] {
        let record = single(triage().normalize(raw));
        assert!(record.is_diagnostic(), "{raw:?} should be diagnostic");
    }
}

#[test]
fn empty_list_is_diagnostic() {
    let record = single(brand().normalize(r#"{"analysis": []}"#));
    assert!(record.is_diagnostic());
    assert_eq!(record.get("sentiment"), Some("Error"));
}

#[test]
fn truncated_json_does_not_panic() {
    let normalized = brand().normalize(r#"[{"clothing_id": "A1", "sentiment": "Pos"#);
    assert!(!normalized.records().is_empty());
}

#[test]
fn diagnostic_record_serializes_its_reason() {
    let record = single(triage().normalize("nothing useful"));
    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(json["status"], "Error");
    assert!(json["diagnostic"].is_string());
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn pipe_form_round_trips() {
    let normalizer = triage();
    let inputs = [
        "Type: A | Status: B | Aspect: C | Action: D",
        "Type: Fit | Extra Note: runs large",
        "Status: Waiting: on supplier",
    ];

    for raw in inputs {
        let first = single(normalizer.normalize(raw));
        let second = single(normalizer.normalize(&first.to_pipe_string()));
        assert_eq!(first, second, "round trip changed {raw:?}");
    }
}

#[test]
fn brand_pipe_form_round_trips_with_empty_default() {
    let normalizer = brand();
    let first = single(normalizer.normalize("Clothing ID: 7 | Sentiment: Positive"));
    let second = single(normalizer.normalize(&first.to_pipe_string()));
    assert_eq!(first, second);
}
