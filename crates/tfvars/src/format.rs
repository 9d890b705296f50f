//! canonical tfvars formatting
//!
//! The output is stable: formatting a document, parsing it again and formatting the result
//! yields the same text. Integers and decimals keep their kind (`42` vs `42.0`).
//!
//! ```
//! let assignments = tfvars::parse_assignments(r#"tags = {Name = "web", "cost-center" = 42}"#).unwrap();
//! assert_eq!(
//!     tfvars::format_document(&assignments),
//!     "tags = {\n  Name          = \"web\"\n  \"cost-center\" = 42\n}\n"
//! );
//! ```
use crate::parser::{is_identifier_continue, is_identifier_start};
use crate::value::{Map, Value};
use std::borrow::Cow;

const INDENT: &str = "  ";

/// Formats top-level assignments, one `key = value` per key, ending with a newline
pub fn format_document(assignments: &Map) -> String {
    let mut output = String::new();
    for (key, value) in assignments {
        output.push_str(&format_assignment_key(key));
        output.push_str(" = ");
        output.push_str(&render(value, 0));
        output.push('\n');
    }

    if output.is_empty() {
        output.push('\n');
    }

    output
}

/// Formats a single value as it would appear at the top level of a document
pub fn format_value(value: &Value) -> String {
    render(value, 0)
}

/// Formats an object key, quoting it unless it is a plain identifier (`[A-Za-z_][A-Za-z0-9_]*`)
pub fn format_key(key: &str) -> Cow<'_, str> {
    let mut chars = key.chars();
    let bare = chars.next().is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_alphanumeric() || ch == '_');

    if bare {
        Cow::Borrowed(key)
    } else {
        Cow::Owned(quote(key))
    }
}

/// Top-level keys may additionally contain `-`, like every identifier the parser accepts
fn format_assignment_key(key: &str) -> Cow<'_, str> {
    let mut chars = key.chars();
    let bare = chars.next().is_some_and(is_identifier_start) && chars.all(is_identifier_continue);

    if bare {
        Cow::Borrowed(key)
    } else {
        Cow::Owned(quote(key))
    }
}

/// Double-quotes `text`, escaping only what the parser requires
pub fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\u{8}' => quoted.push_str("\\b"),
            '\u{c}' => quoted.push_str("\\f"),
            ch if (ch as u32) < 0x20 => quoted.push_str(&format!("\\u{:04x}", ch as u32)),
            ch => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

/// Formats a decimal so that it parses back as a decimal
///
/// # Panics
/// Panics for NaN and infinities, the parser never produces them.
fn format_decimal(decimal: f64) -> String {
    assert!(
        decimal.is_finite(),
        "non-finite decimal {decimal} can not be formatted as tfvars"
    );

    // `Debug` is the shortest representation that round-trips and switches to exponent
    // notation for very large and very small magnitudes
    let mut formatted = format!("{decimal:?}");
    if !formatted.contains(['.', 'e', 'E']) {
        formatted.push_str(".0");
    }
    formatted
}

fn render(value: &Value, level: usize) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(int) => int.to_string(),
        Value::Decimal(decimal) => format_decimal(*decimal),
        Value::String(s) => quote(s),
        Value::Array(items) => render_array(items, level),
        Value::Object(map) => render_object(map, level),
    }
}

fn render_array(items: &[Value], level: usize) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }

    let indent = INDENT.repeat(level + 1);
    let mut lines = vec!["[".to_string()];
    for (index, item) in items.iter().enumerate() {
        let separator = if index + 1 < items.len() { "," } else { "" };
        lines.push(format!("{indent}{}{separator}", render(item, level + 1)));
    }
    lines.push(format!("{}]", INDENT.repeat(level)));

    lines.join("\n")
}

fn render_object(map: &Map, level: usize) -> String {
    if map.is_empty() {
        return "{}".to_string();
    }

    let keys: Vec<_> = map.keys().map(|key| format_key(key)).collect();
    let width = keys.iter().map(|key| key.chars().count()).max().unwrap_or(0);

    let indent = INDENT.repeat(level + 1);
    let mut lines = vec!["{".to_string()];
    for (key, value) in keys.iter().zip(map.values()) {
        let padding = " ".repeat(width - key.chars().count());
        lines.push(format!("{indent}{key}{padding} = {}", render(value, level + 1)));
    }
    lines.push(format!("{}}}", INDENT.repeat(level)));

    lines.join("\n")
}
