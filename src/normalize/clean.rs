use std::sync::LazyLock;

use regex::Regex;

/// Triple-backtick fence, optionally followed by a language tag. A tag only
/// counts when it ends the line, so "```Type: A" keeps its first word; `json`
/// is also accepted glued to the payload ("```json[...]").
static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)```(?:[a-z0-9_+-]+[ \t]*(?:\r?\n|$)|json)?").expect("fence pattern is valid")
});

static LABEL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:result|output|analysis|review)[ \t]*:[ \t]*")
        .expect("prefix pattern is valid")
});

/// Remove every markdown fence marker and trim the remainder.
pub fn strip_fences(text: &str) -> String {
    FENCE.replace_all(text, "").trim().to_string()
}

/// Remove one leading `Result:` / `Output:` / `Analysis:` / `Review:` label.
pub fn strip_label_prefix(text: &str) -> &str {
    let text = text.trim_start();
    match LABEL_PREFIX.find(text) {
        Some(m) => text[m.end()..].trim(),
        None => text.trim(),
    }
}

/// Fences first, then the label, so "```\nResult: ...```" loses both.
pub fn clean(text: &str) -> String {
    let fenced = strip_fences(text);
    strip_label_prefix(&fenced).to_string()
}
