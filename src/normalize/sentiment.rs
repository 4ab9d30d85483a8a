use serde_json::{Map, Value};

/// A classifier prediction: an object with a `score` and at most a `label` besides.
pub fn is_prediction(value: &Value) -> bool {
    value.as_object().is_some_and(is_prediction_map)
}

pub fn is_prediction_map(map: &Map<String, Value>) -> bool {
    map.contains_key("score") && map.keys().all(|k| k == "label" || k == "score")
}

/// `[{label, score}, ...]` as returned by a HuggingFace text-classification model.
pub fn is_prediction_list(items: &[Value]) -> bool {
    !items.is_empty() && items.iter().all(is_prediction)
}

/// The prediction with the highest score; the first one wins ties.
pub fn top_prediction(items: &[Value]) -> Option<&Map<String, Value>> {
    let mut best: Option<(&Map<String, Value>, f64)> = None;
    for map in items.iter().filter_map(Value::as_object) {
        let score = map.get("score").and_then(score_value).unwrap_or(f64::MIN);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((map, score));
        }
    }
    best.map(|(map, _)| map)
}

/// `LABEL_1`/`POSITIVE` → `POSITIVE`, `LABEL_0`/`NEGATIVE` → `NEGATIVE`,
/// anything else uppercased, `UNKNOWN` when missing.
pub fn canonical_label(label: Option<&str>) -> String {
    let label = label.map(str::trim).unwrap_or_default().to_uppercase();
    match label.as_str() {
        "" => "UNKNOWN".to_string(),
        "LABEL_1" | "POSITIVE" => "POSITIVE".to_string(),
        "LABEL_0" | "NEGATIVE" => "NEGATIVE".to_string(),
        _ => label,
    }
}

/// A 0..1 probability as a percentage with one decimal place.
pub fn format_score(score: &Value) -> Option<String> {
    score_value(score).map(|s| format!("{:.1}%", s * 100.0))
}

fn score_value(score: &Value) -> Option<f64> {
    let parsed = match score {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|s| s.is_finite())
}

/// Label and score pairs for the top prediction, ready for a profile.
pub fn prediction_pairs(prediction: &Map<String, Value>) -> Vec<(String, String)> {
    let label = prediction.get("label").and_then(Value::as_str);
    let mut pairs = vec![("label".to_string(), canonical_label(label))];
    if let Some(score) = prediction.get("score").and_then(score_text) {
        pairs.push(("score".to_string(), score));
    }
    pairs
}

/// Formatted percentage, or the raw score text when it is not a number.
fn score_text(score: &Value) -> Option<String> {
    if let Some(formatted) = format_score(score) {
        return Some(formatted);
    }
    let raw = match score {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!raw.is_empty()).then_some(raw)
}
