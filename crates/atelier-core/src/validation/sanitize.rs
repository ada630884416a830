//! Field sanitizers
//!
//! Turns raw submitted form values into the value stored for a metadata key.
//! Invalid input never errors; it sanitizes to an empty value, which the
//! publish gate then reports if the field is required.

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use uuid::Uuid;

use crate::models::Sanitizer;

/// Tags kept by the rich text sanitizer; attributes are dropped except `href` on links
pub const ALLOWED_RICH_TEXT_TAGS: &[&str] = &[
    "p",
    "br",
    "strong",
    "em",
    "ul",
    "ol",
    "li",
    "a",
    "blockquote",
];

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid regex"));
static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("valid regex"));
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static TAG_PARTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<\s*(/?)\s*([a-zA-Z][a-zA-Z0-9]*)([^>]*)>").expect("valid regex")
});
static HREF_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href\s*=\s*["']?(https?://[^"'\s>]+)"#).expect("valid regex")
});
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static HTTP_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid regex"));

fn remove_blocks(input: &str) -> String {
    let without_scripts = SCRIPT_BLOCK.replace_all(input, "");
    STYLE_BLOCK.replace_all(&without_scripts, "").into_owned()
}

/// Remove every tag, including the contents of script and style blocks
pub fn strip_tags(input: &str) -> String {
    ANY_TAG.replace_all(&remove_blocks(input), "").into_owned()
}

fn sanitize_text(raw: &str) -> String {
    WHITESPACE
        .replace_all(&strip_tags(raw), " ")
        .trim()
        .to_string()
}

fn sanitize_textarea(raw: &str) -> String {
    let normalized = raw.replace("\r\n", "\n");
    strip_tags(&normalized)
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn sanitize_rich_text(raw: &str) -> String {
    let cleaned = remove_blocks(raw);
    TAG_PARTS
        .replace_all(&cleaned, |caps: &regex::Captures| {
            let closing = &caps[1];
            let name = caps[2].to_lowercase();
            if !ALLOWED_RICH_TEXT_TAGS.contains(&name.as_str()) {
                return String::new();
            }
            if name == "a" && closing.is_empty() {
                if let Some(href) = HREF_ATTR.captures(&caps[3]) {
                    return format!("<a href=\"{}\">", &href[1]);
                }
            }
            format!("<{}{}>", closing, name)
        })
        .trim()
        .to_string()
}

fn sanitize_url(raw: &str) -> String {
    let candidate = raw.trim();
    if HTTP_URL.is_match(candidate) {
        candidate.to_string()
    } else {
        String::new()
    }
}

fn sanitize_date(raw: &str) -> String {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn sanitize_choice(raw: &str, options: &[&str]) -> String {
    let candidate = raw.trim().to_lowercase();
    if options.contains(&candidate.as_str()) {
        candidate
    } else {
        String::new()
    }
}

fn sanitize_id_list(raw: &[String]) -> Value {
    let mut ids: Vec<Uuid> = Vec::new();
    for part in raw
        .iter()
        .flat_map(|value| value.split(|c: char| c == ',' || c.is_whitespace()))
    {
        if let Ok(id) = Uuid::parse_str(part.trim()) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    Value::Array(ids.into_iter().map(|id| Value::String(id.to_string())).collect())
}

/// Sanitize the raw values submitted for one field.
///
/// Scalar sanitizers read the first submitted value; `IdList` reads all of them.
pub fn sanitize_field(sanitizer: Option<Sanitizer>, raw: &[String]) -> Value {
    let first = raw.first().map(String::as_str).unwrap_or("");
    let text = match sanitizer {
        None => first.trim().to_string(),
        Some(Sanitizer::Text) => sanitize_text(first),
        Some(Sanitizer::Textarea) => sanitize_textarea(first),
        Some(Sanitizer::RichText) => sanitize_rich_text(first),
        Some(Sanitizer::Url) => sanitize_url(first),
        Some(Sanitizer::Date) => sanitize_date(first),
        Some(Sanitizer::Choice(options)) => sanitize_choice(first, options),
        Some(Sanitizer::IdList) => return sanitize_id_list(raw),
    };
    Value::String(text)
}

/// Whether a stored metadata value counts as "not set"
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
