//! History text simplification for prompt building

use crate::payload::decode_for_display;
use regex::Regex;
use std::sync::LazyLock;

static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][^<>]*>").expect("markup tag pattern is valid"));

/// Expand a responder line holding serialized events into `name: text` lines.
///
/// Lines without a speaker name are kept bare; events with blank text are
/// skipped. Anything that does not parse is returned unchanged.
pub fn expand_responder(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let lines: Vec<String> = decode_for_display(text)
        .unwrap_or_default()
        .into_iter()
        .filter(|e| !e.text.trim().is_empty())
        .map(|e| {
            if e.name.trim().is_empty() {
                e.text
            } else {
                format!("{}: {}", e.name, e.text)
            }
        })
        .collect();

    if lines.is_empty() {
        text.to_string()
    } else {
        lines.join("\n")
    }
}

/// Strip markup tags and collapse the text onto one trimmed line
pub fn clean_line(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    MARKUP_TAG
        .replace_all(text, "")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}
