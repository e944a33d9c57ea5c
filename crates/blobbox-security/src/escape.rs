//! HTML escaping of string values

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value;

lazy_static! {
    static ref SPECIAL_CHARS: Regex = Regex::new(r#"[&<>"']"#).unwrap();
}

/// Replace `& < > " '` with their HTML entities
pub fn escape_html(input: &str) -> Cow<'_, str> {
    SPECIAL_CHARS.replace_all(input, |caps: &Captures| match &caps[0] {
        "&" => "&amp;",
        "<" => "&lt;",
        ">" => "&gt;",
        "\"" => "&quot;",
        _ => "&#039;",
    })
}

/// Escape every string inside `value`, descending through arrays and object
/// values. Object keys, numbers, booleans and nulls are left alone.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(escape_html(&s).into_owned()),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, sanitize_value(value)))
                .collect(),
        ),
        other => other,
    }
}
