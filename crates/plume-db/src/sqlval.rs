//! Bridges [`plume_query::Value`] and rusqlite's dynamic column type.

use rusqlite::types::Value as SqlValue;

use plume_query::Value;

/// Converts a document value into a bound parameter for a shadow column.
/// Lists and maps (never expected on an indexed field, but not rejected
/// either) fall back to their JSON text form.
pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(if *b { 1 } else { 0 }),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::List(_) | Value::Map(_) => {
            SqlValue::Text(serde_json::to_string(value).unwrap_or_default())
        }
    }
}

/// Converts a column value read back from an index-only plan into a
/// document value, preserving the stored SQLite storage class exactly
/// (an `INTEGER` column never becomes a `Float`, even if the query's
/// literal was typed as one).
pub fn from_sql_value(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::Int(i),
        SqlValue::Real(f) => Value::Float(f),
        SqlValue::Text(s) => Value::Text(s),
        SqlValue::Blob(bytes) => Value::Text(String::from_utf8_lossy(&bytes).into_owned()),
    }
}
