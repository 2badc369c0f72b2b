//! FILENAME: core/resultset/src/value.rs
//! Cell Values - Scalars and their JavaScript-compatible coercions.
//!
//! The values in a query response come from a JavaScript-facing API, so
//! the parsing and stringification rules here deliberately follow
//! `parseFloat` / `String(value)` behavior rather than Rust's stricter
//! defaults. Measures frequently arrive as strings ("5" instead of 5),
//! which is why `parse_float` accepts numeric prefixes.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ============================================================================
// TYPES
// ============================================================================

/// A single cell value from a response row.
///
/// Untagged on the wire: `null`, `true`, `3.5` and `"3.5"` all map onto
/// the matching variant. Missing fields are represented by [`Value::Null`]
/// at the call sites that need a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

/// One tuple of values along a pivot axis, in member order.
///
/// Axis tuples are short (one or two members for every predefined query),
/// so they live inline.
pub type AxisValues = SmallVec<[Value; 4]>;

// ============================================================================
// VALUE
// ============================================================================

impl Value {
    /// Creates a text value.
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    /// True when the cell carries no value at all.
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric form of the value under `parseFloat` rules.
    ///
    /// Booleans and nulls have no numeric prefix and come back as NaN,
    /// exactly as `parseFloat(String(value))` would produce.
    pub fn parse_float(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Text(s) => parse_float_prefix(s),
            Value::Null | Value::Bool(_) => f64::NAN,
        }
    }

    /// Numeric form for charting: `None` for a missing cell, otherwise
    /// the `parse_float` result (which may be NaN for garbage input).
    pub fn as_measure(&self) -> Option<f64> {
        if self.is_missing() {
            None
        } else {
            Some(self.parse_float())
        }
    }

    /// The value as the dashboard displays it, following `String(value)`.
    ///
    /// Null becomes the empty string; the table layer never reaches this
    /// for nulls because missing values pass through unformatted.
    pub fn display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number_display(*n),
            Value::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

// ============================================================================
// COERCION HELPERS
// ============================================================================

/// Parses the longest numeric prefix of a string, `parseFloat`-style.
///
/// Leading whitespace is skipped, an optional sign and the literal word
/// `Infinity` are honored, and trailing junk after the number is ignored.
/// A string with no numeric prefix parses to NaN.
pub fn parse_float_prefix(input: &str) -> f64 {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let mut saw_digit = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        saw_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            saw_digit = true;
        }
    }
    if !saw_digit {
        return f64::NAN;
    }

    // An exponent only counts when it has at least one digit; "1e" is 1.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut cursor = end + 1;
        if cursor < bytes.len() && (bytes[cursor] == b'+' || bytes[cursor] == b'-') {
            cursor += 1;
        }
        let exponent_digits_at = cursor;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        if cursor > exponent_digits_at {
            end = cursor;
        }
    }

    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// Renders an f64 the way `String(number)` does for the values that
/// actually flow through dashboards: integers without a decimal point,
/// everything else via the shortest round-tripping form.
fn format_number_display(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e21 {
        return format!("{:.0}", value);
    }
    value.to_string()
}

/// Display form of one axis value.
///
/// Null and the empty string both join axis strings as visible
/// placeholders so that distinct rows stay distinguishable on the axis.
pub(crate) fn axis_display(value: &Value) -> String {
    match value {
        Value::Null => "∅".to_string(),
        Value::Text(s) if s.is_empty() => "[Empty string]".to_string(),
        other => other.display_string(),
    }
}

/// Joins one axis tuple into a single string with the given separator.
///
/// `", "` produces the human-facing form used for x-axis labels and
/// series titles; `","` produces the compact form used as series keys.
pub fn axis_values_string(values: &[Value], separator: &str) -> String {
    let parts: Vec<String> = values.iter().map(axis_display).collect();
    parts.join(separator)
}

// ============================================================================
// TESTS
// ============================================================================
