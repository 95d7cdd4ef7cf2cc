//! Converts a caller-supplied predicate mapping into a [`Predicate`] tree.

use crate::error::QueryError;
use crate::predicate::Predicate;
use crate::value::{Document, Value};

type ParseResult<T> = Result<T, QueryError>;

/// Parses a top-level predicate mapping. Each entry becomes a child of an
/// implicit top-level `And`.
pub fn parse_query(mapping: &Document) -> ParseResult<Predicate> {
    let mut children = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        children.push(parse_entry(key, value)?);
    }
    Ok(Predicate::And(children))
}

fn parse_entry(key: &str, value: &Value) -> ParseResult<Predicate> {
    if let Some(op) = key.strip_prefix('$') {
        return parse_logical(op, value);
    }
    match value {
        Value::Map(ops) if !ops.is_empty() => parse_field_ops(key, ops),
        other => Ok(Predicate::Equal(key.to_string(), other.clone())),
    }
}

/// `$and` / `$or` take an array of child mappings; any other top-level
/// `$`-key is rejected.
fn parse_logical(op: &str, value: &Value) -> ParseResult<Predicate> {
    let Value::List(items) = value else {
        return Err(QueryError::BadQuery(format!(
            "${op} expects an array of predicate mappings"
        )));
    };
    let mut children = Vec::with_capacity(items.len());
    for item in items {
        let Value::Map(mapping) = item else {
            return Err(QueryError::BadQuery(format!(
                "${op} array entries must be predicate mappings"
            )));
        };
        children.push(parse_query(mapping)?);
    }
    match op {
        "and" => Ok(Predicate::And(children)),
        "or" => Ok(Predicate::Or(children)),
        other => Err(QueryError::BadQuery(format!("unknown top-level operator ${other}"))),
    }
}

/// A field whose value is a non-empty mapping of `$op` entries: either a
/// single comparison, or an implicit conjunction over multiple comparisons
/// (which may themselves nest `$and`/`$or`).
fn parse_field_ops(field: &str, ops: &Document) -> ParseResult<Predicate> {
    if ops.len() == 1 {
        let (op, value) = ops.iter().next().expect("len == 1");
        return parse_comparison(field, op, value);
    }
    let mut children = Vec::with_capacity(ops.len());
    for (op, value) in ops {
        children.push(parse_comparison(field, op, value)?);
    }
    Ok(Predicate::ImplicitAnd(children))
}

fn parse_comparison(field: &str, op: &str, value: &Value) -> ParseResult<Predicate> {
    match op {
        "$eq" => Ok(Predicate::Equal(field.to_string(), value.clone())),
        "$ne" => Ok(Predicate::NotEqual(field.to_string(), value.clone())),
        "$gt" => Ok(Predicate::GreaterThan(field.to_string(), value.clone())),
        "$gte" => Ok(Predicate::GreaterThanOrEqual(field.to_string(), value.clone())),
        "$lt" => Ok(Predicate::LessThan(field.to_string(), value.clone())),
        "$lte" => Ok(Predicate::LessThanOrEqual(field.to_string(), value.clone())),
        "$and" => parse_logical("and", value).map(|p| wrap_field_logical(field, p)),
        "$or" => parse_logical("or", value).map(|p| wrap_field_logical(field, p)),
        other => Err(QueryError::BadQuery(format!(
            "unknown operator {other} on field {field}"
        ))),
    }
}

/// `$and`/`$or` nested inside a field's operator mapping (e.g.
/// `{field: {$and: [...]}}`) do not reference `field` themselves — the
/// nested mapping carries its own field names — so the parsed logical node
/// is used as-is.
fn wrap_field_logical(_field: &str, inner: Predicate) -> Predicate {
    inner
}
