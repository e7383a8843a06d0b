//! Column encoding shared by the row mappers.
//!
//! Timestamps are stored as fixed-width RFC-3339 UTC strings so that text
//! comparison (`ORDER BY`, `BETWEEN`) matches chronological order.  JSON
//! columns are decoded leniently: a malformed value is logged and replaced
//! with an empty default so one bad row never hides the rest of a page.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use serde_json::{Map, Value};

pub(crate) fn ts_to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn ts_from_sql(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn opt_ts_from_sql(
    idx: usize,
    raw: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    raw.map(|s| ts_from_sql(idx, &s)).transpose()
}

/// Parse one of the closed text tags (category, status, kind, role).
pub(crate) fn tag_from_sql<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn json_to_sql<T: serde::Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string(value)
}

/// Decode a JSON object column; `NULL`, empty or malformed values give an
/// empty map.
pub(crate) fn decode_map(row_id: i64, column: &str, raw: Option<String>) -> Map<String, Value> {
    match raw.as_deref().filter(|s| !s.trim().is_empty()) {
        None => Map::new(),
        Some(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Null) => Map::new(),
            Ok(_) => {
                tracing::warn!(row_id, column, "stored JSON is not an object, using empty map");
                Map::new()
            }
            Err(e) => {
                tracing::warn!(row_id, column, error = %e, "malformed JSON column, using empty map");
                Map::new()
            }
        },
    }
}

/// Decode a JSON array of strings; anything else gives an empty list.
pub(crate) fn decode_list(row_id: i64, column: &str, raw: Option<String>) -> Vec<String> {
    match raw.as_deref().filter(|s| !s.trim().is_empty()) {
        None => Vec::new(),
        Some(text) => match serde_json::from_str::<Option<Vec<String>>>(text) {
            Ok(list) => list.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(row_id, column, error = %e, "malformed JSON list, using empty list");
                Vec::new()
            }
        },
    }
}

/// Decode an optional free-form JSON value; malformed values become `None`.
pub(crate) fn decode_value(row_id: i64, column: &str, raw: Option<String>) -> Option<Value> {
    let text = raw.filter(|s| !s.trim().is_empty())?;
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(row_id, column, error = %e, "malformed JSON value, dropping it");
            None
        }
    }
}
