use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A document is an ordered mapping from string keys to [`Value`]s.
///
/// Order is preserved on both read and write so that catalog round-trips
/// and back-filled shadow columns stay byte-for-byte stable.
pub type Document = IndexMap<String, Value>;

/// A schemaless, JSON-like value.
///
/// Mirrors JSON's value space but keeps `Int` and `Float` distinct, since
/// the backing shadow columns are typed `TEXT | INTEGER | REAL` and the
/// index-only read path must round-trip the stored tag exactly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Map(Document),
}

impl Value {
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn as_map(&self) -> Option<&Document> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    fn tag_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Text(_) => 3,
            Value::List(_) => 4,
            Value::Map(_) => 5,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// JSON-style equality: numeric values compare across the `Int`/`Float` tower,
/// everything else is a straight structural comparison.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Total order over [`Value`] (resolves the "undefined comparison" note in
/// the design docs): values are first ranked by tag, with `Int`/`Float`
/// sharing a numeric tower; within a tag the natural ordering applies.
/// `match`/`push_down` never panic on an incomparable pair — they simply
/// fall back to this order.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::List(x), Value::List(y)) => {
            for (xv, yv) in x.iter().zip(y.iter()) {
                let ord = compare_values(xv, yv);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Map(x), Value::Map(y)) => {
            for ((xk, xv), (yk, yv)) in x.iter().zip(y.iter()) {
                let key_ord = xk.cmp(yk);
                if key_ord != Ordering::Equal {
                    return key_ord;
                }
                let val_ord = compare_values(xv, yv);
                if val_ord != Ordering::Equal {
                    return val_ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => a.tag_rank().cmp(&b.tag_rank()),
    }
}

/// Emits a literal suitable for inline interpolation into a SQL fragment.
///
/// Strings are double-quoted with embedded quotes doubled; numbers and
/// booleans use their canonical textual form (`true`/`false` become `1`/`0`,
/// SQLite has no native boolean type). This matches the source's
/// literal-interpolation read path rather than parameter binding.
pub fn format_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Text(s) => format!("\"{}\"", s.replace('"', "\"\"")),
        Value::List(_) | Value::Map(_) => {
            format!("\"{}\"", serde_json::to_string(value).unwrap_or_default().replace('"', "\"\""))
        }
    }
}

/// Quotes a field path for use as a SQL identifier (shadow column name).
pub fn quote_ident(path: &str) -> String {
    format!("\"{}\"", path.replace('"', "\"\""))
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serialize_value(self, serializer)
    }
}

fn serialize_value<S>(value: &Value, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Value::Null => serializer.serialize_unit(),
        Value::Bool(b) => serializer.serialize_bool(*b),
        Value::Int(i) => serializer.serialize_i64(*i),
        Value::Float(f) => serializer.serialize_f64(*f),
        Value::Text(s) => serializer.serialize_str(s),
        Value::List(items) => {
            use serde::ser::SerializeSeq;
            let mut seq = serializer.serialize_seq(Some(items.len()))?;
            for item in items {
                seq.serialize_element(item)?;
            }
            seq.end()
        }
        Value::Map(map) => {
            use serde::ser::SerializeMap;
            let mut ser_map = serializer.serialize_map(Some(map.len()))?;
            for (k, v) in map {
                ser_map.serialize_entry(k, v)?;
            }
            ser_map.end()
        }
    }
}
