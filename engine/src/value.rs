//! Type-aware interpretation of JSON field values.
//!
//! Records carry plain `serde_json::Value`s; the schema's [`FieldType`]
//! decides how they compare. Every value is lowered to a [`SortKey`] once,
//! which gives the engine a total order to sort and compare with.

use crate::FieldType;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse an ISO-8601 date (`2023-10-15`), local date-time
/// (`2023-11-15T09:30:00`) or RFC 3339 timestamp.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// JSON kind name used in type mismatch errors.
pub fn describe(value: &Value) -> String {
    let name = match value {
        Value::Null => "Null",
        Value::Bool(_) => "Bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "Int",
        Value::Number(_) => "Float",
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    };
    name.to_string()
}

/// Null, absent and empty-string values all count as blank.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// The text a free-text search matches against. Blank values have none.
pub fn search_text(value: Option<&Value>) -> Option<Cow<'_, str>> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        other => Some(Cow::Owned(other.to_string())),
    }
}

/// Equality used by categorical filters: numbers compare by value so
/// `4` matches `4.0`, everything else by JSON equality.
pub fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// A field value lowered for comparison under its declared type.
#[derive(Debug, Clone)]
pub enum SortKey {
    Missing,
    Bool(bool),
    Number(f64),
    Date(NaiveDateTime),
    Text(String),
}

impl SortKey {
    /// Lower `value` according to `field_type`. Values that do not fit the
    /// declared type fall back to their text form.
    pub fn new(field_type: FieldType, value: Option<&Value>) -> Self {
        let value = match value {
            Some(v) if !is_blank(Some(v)) => v,
            _ => return SortKey::Missing,
        };

        let typed = match field_type {
            FieldType::Number | FieldType::Currency => match value {
                Value::Number(n) => n.as_f64().map(SortKey::Number),
                Value::String(s) => s.trim().parse().ok().map(SortKey::Number),
                _ => None,
            },
            FieldType::Date => value.as_str().and_then(parse_date).map(SortKey::Date),
            FieldType::Bool => value.as_bool().map(SortKey::Bool),
            FieldType::Text | FieldType::Enum => None,
        };

        typed.unwrap_or_else(|| match value {
            Value::String(s) => SortKey::Text(s.clone()),
            other => SortKey::Text(other.to_string()),
        })
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Missing => 0,
            SortKey::Bool(_) => 1,
            SortKey::Number(_) => 2,
            SortKey::Date(_) => 3,
            SortKey::Text(_) => 4,
        }
    }

    /// Compare two keys of the same kind. `None` when either is missing or
    /// the kinds differ.
    pub fn compare_same_kind(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (SortKey::Bool(a), SortKey::Bool(b)) => Some(a.cmp(b)),
            (SortKey::Number(a), SortKey::Number(b)) => Some(a.total_cmp(b)),
            (SortKey::Date(a), SortKey::Date(b)) => Some(a.cmp(b)),
            (SortKey::Text(a), SortKey::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_same_kind(other)
            .unwrap_or_else(|| self.rank().cmp(&other.rank()))
    }
}
