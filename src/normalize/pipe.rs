/// Split `Key: Value | Key: Value` text into lowercase key / trimmed value pairs.
///
/// Segments are separated by `|` or line breaks and split on their first colon.
/// Segments missing either side are skipped. Markdown emphasis and list
/// bullets around keys are dropped; values keep their case.
pub fn parse_pairs(text: &str) -> Vec<(String, String)> {
    text.split(['|', '\n'])
        .filter_map(|segment| {
            let (key, value) = segment.split_once(':')?;
            let key = clean_key(key);
            let value = clean_value(value);
            if key.is_empty() || value.is_empty() {
                None
            } else {
                Some((key, value))
            }
        })
        .collect()
}

pub fn clean_key(key: &str) -> String {
    key.trim_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '"' | '-' | '#' | '`'))
        .to_lowercase()
}

fn clean_value(value: &str) -> String {
    value
        .trim_matches(|c: char| c.is_whitespace() || c == '*')
        .to_string()
}
