//! Row-to-entity parsing helpers.
//!
//! Every repo converts `libsql::Row` (column-indexed) into typed entity
//! structs. These helpers isolate the parsing and handle both datetime
//! formats (`SQLite`'s `datetime('now')` and Rust's `to_rfc3339()`).

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DatabaseError;

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string matches neither format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse an optional TEXT column as `Option<DateTime<Utc>>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string cannot be parsed.
pub fn parse_optional_datetime(s: Option<&str>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_datetime(s)?)),
        _ => Ok(None),
    }
}

/// `start` plus `days`, or a validation error naming `setting` on overflow.
///
/// # Errors
///
/// Returns `DatabaseError::Validation` if the sum is not representable.
pub fn days_after(start: DateTime<Utc>, days: i64, setting: &str) -> Result<DateTime<Utc>, DatabaseError> {
    Duration::try_days(days)
        .and_then(|d| start.checked_add_signed(d))
        .ok_or_else(|| DatabaseError::Validation(format!("{setting} is out of range: {days} days")))
}

/// Parse a TEXT column into a `snake_case` serde enum.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any variant.
pub fn parse_enum<T: DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Parse an optional enum column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty value does not match any variant.
pub fn parse_optional_enum<T: DeserializeOwned>(s: Option<&str>) -> Result<Option<T>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_enum(s)?)),
        _ => Ok(None),
    }
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read an INTEGER column holding a 0-100 score.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the value is outside `u8`.
pub fn get_u8(row: &libsql::Row, idx: i32) -> Result<u8, DatabaseError> {
    let v = row.get::<i64>(idx)?;
    u8::try_from(v).map_err(|_| DatabaseError::Query(format!("column {idx}: {v} out of range")))
}

/// Nullable variant of [`get_u8`].
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the value is outside `u8`.
pub fn get_opt_u8(row: &libsql::Row, idx: i32) -> Result<Option<u8>, DatabaseError> {
    row.get::<Option<i64>>(idx)?
        .map(|v| {
            u8::try_from(v)
                .map_err(|_| DatabaseError::Query(format!("column {idx}: {v} out of range")))
        })
        .transpose()
}

/// Read a non-negative INTEGER column as `u32`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the value is negative or too large.
pub fn get_u32(row: &libsql::Row, idx: i32) -> Result<u32, DatabaseError> {
    let v = row.get::<i64>(idx)?;
    u32::try_from(v).map_err(|_| DatabaseError::Query(format!("column {idx}: {v} out of range")))
}

/// Read an INTEGER column as `bool`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_bool(row: &libsql::Row, idx: i32) -> Result<bool, DatabaseError> {
    Ok(row.get::<i64>(idx)? != 0)
}

/// Parse a JSON TEXT column into a typed value.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the column holds invalid JSON.
pub fn parse_json<T: DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(s).map_err(|e| DatabaseError::Query(format!("Invalid JSON in column: {e}")))
}

/// Extract an optional JSON value from a TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string contains invalid JSON.
pub fn parse_optional_json(s: Option<&str>) -> Result<Option<serde_json::Value>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_json(s)?)),
        _ => Ok(None),
    }
}

/// Serialize a value for storage in a JSON TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Other` if serialization fails.
pub fn to_json_text<T: Serialize + ?Sized>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(DatabaseError::json)
}

/// Trim, lowercase and dedupe tags, preserving first-seen order.
#[must_use]
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Map an optional string to a `libsql::Value`, `NULL` for `None`.
pub fn opt_value(v: Option<&str>) -> libsql::Value {
    v.map_or(libsql::Value::Null, |s| libsql::Value::Text(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_datetime_formats() {
        let a = parse_datetime("2026-02-09T14:30:00+00:00").unwrap();
        let b = parse_datetime("2026-02-09 14:30:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn days_after_rejects_overflow() {
        let start = parse_datetime("2026-02-09T14:30:00+00:00").unwrap();
        let week = days_after(start, 7, "ttl").unwrap();
        assert_eq!(week, parse_datetime("2026-02-16T14:30:00+00:00").unwrap());
        let err = days_after(start, 1_000_000_000_000_000, "ttl").unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(ref m) if m.starts_with("ttl")));
    }

    #[test]
    fn enum_parsing() {
        use beacon_core::enums::ThemeStatus;
        let status: ThemeStatus = parse_enum("needs_research").unwrap();
        assert_eq!(status, ThemeStatus::NeedsResearch);
        assert!(parse_enum::<ThemeStatus>("maybe").is_err());
        assert_eq!(parse_optional_enum::<ThemeStatus>(Some("")).unwrap(), None);
    }

    #[test]
    fn tags_are_normalized_in_order() {
        let tags = vec![" Export".into(), "csv".into(), "EXPORT".into(), String::new()];
        assert_eq!(normalize_tags(&tags), vec!["export", "csv"]);
    }
}
