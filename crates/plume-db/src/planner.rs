//! Query Planner / `SelectQuery`: binds a predicate and projection to a
//! collection, compiles the SQL statement, executes it, and applies
//! whatever residual filtering and projection the pushdown left behind.

use std::collections::HashSet;

use rusqlite::Connection;

use plume_query::{quote_ident, Document, Predicate, Projection, Value};

use crate::codec;
use crate::error::Result;
use crate::sqlval;

/// True once a predicate has no work left for `match` — either it fully
/// collapsed to [`Predicate::True`], or it started (and stayed) an empty
/// conjunction, e.g. an unfiltered `find({})`.
pub(crate) fn residual_is_empty(predicate: &Predicate) -> bool {
    match predicate {
        Predicate::True => true,
        Predicate::And(children) | Predicate::ImplicitAnd(children) => children.is_empty(),
        _ => false,
    }
}

/// The compiled SQL plan for one `find`/`find_one` call, plus everything
/// needed to interpret its rows.
pub struct CompiledQuery {
    pub sql: String,
    /// `Some(fields)` for an index-only plan: the `SELECT` list, in order.
    pub index_only_columns: Option<Vec<String>>,
    pub residual: Predicate,
}

/// Compiles a predicate + projection against `table`'s `indexed_fields`
/// into SQL. Pure (no I/O) so it can be asserted against directly in tests.
pub fn compile(
    table: &str,
    indexed_fields: &HashSet<String>,
    mut predicate: Predicate,
    projection: &Projection,
    limit: Option<usize>,
) -> CompiledQuery {
    let where_fragment = predicate.push_down(indexed_fields);
    let residual_empty = residual_is_empty(&predicate);

    let include_fields = projection.include_fields();
    let index_only = !include_fields.is_empty()
        && include_fields.iter().all(|f| indexed_fields.contains(f))
        && residual_empty;

    let select = if index_only {
        include_fields
            .iter()
            .map(|f| quote_ident(f))
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        "_data".to_string()
    };

    let mut sql = format!("SELECT {select} FROM {table}");
    if let Some(frag) = &where_fragment {
        sql.push_str(" WHERE ");
        sql.push_str(frag);
    }
    // A server-side LIMIT would otherwise truncate rows before residual
    // filtering has a chance to run over the full candidate set.
    if let Some(n) = limit {
        if residual_empty {
            sql.push_str(&format!(" LIMIT {n}"));
        }
    }

    CompiledQuery {
        sql,
        index_only_columns: if index_only {
            Some(include_fields.to_vec())
        } else {
            None
        },
        residual: predicate,
    }
}

/// Executes a compiled plan and applies residual filtering/projection.
pub fn execute(
    conn: &Connection,
    compiled: &CompiledQuery,
    projection: &Projection,
    limit: Option<usize>,
) -> Result<Vec<Value>> {
    let mut stmt = conn.prepare(&compiled.sql)?;
    let mut results = Vec::new();

    if let Some(columns) = &compiled.index_only_columns {
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut doc = Value::Map(Document::new());
            for (i, field) in columns.iter().enumerate() {
                let raw: rusqlite::types::Value = row.get(i)?;
                plume_query::set(&mut doc, field, sqlval::from_sql_value(raw));
            }
            results.push(doc);
        }
        return Ok(results);
    }

    let residual_empty = residual_is_empty(&compiled.residual);
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let text: String = row.get(0)?;
        let doc = codec::decode(&text)?;
        if residual_empty || compiled.residual.matches(&doc) {
            results.push(projection.skim(&doc));
            if let Some(n) = limit {
                if results.len() == n {
                    break;
                }
            }
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plume_query::parse_query;

    fn idx(fields: &[&str]) -> HashSet<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    fn q(pairs: &[(&str, Value)]) -> Document {
        let mut m = Document::new();
        for (k, v) in pairs {
            m.insert((*k).to_string(), v.clone());
        }
        m
    }

    #[test]
    fn s2_equal_on_indexed_field() {
        let mapping = q(&[("name", Value::Text("Bakery Cumbersome".into()))]);
        let predicate = parse_query(&mapping).unwrap();
        let compiled = compile("actors", &idx(&["name"]), predicate, &Projection::None, None);
        assert_eq!(
            compiled.sql,
            r#"SELECT _data FROM actors WHERE "name" = "Bakery Cumbersome""#
        );
        assert!(compiled.index_only_columns.is_none());
    }

    #[test]
    fn s3_index_only_plan() {
        let mut ops = Document::new();
        ops.insert("$gt".into(), Value::Int(10));
        let mapping = q(&[("age", Value::Map(ops))]);
        let predicate = parse_query(&mapping).unwrap();
        let mut proj_map = Document::new();
        proj_map.insert("age".into(), Value::Int(1));
        let projection = Projection::parse(&proj_map).unwrap();

        let compiled = compile("actors", &idx(&["age"]), predicate, &projection, None);
        assert_eq!(compiled.sql, r#"SELECT "age" FROM actors WHERE "age" > 10"#);
        assert_eq!(compiled.index_only_columns, Some(vec!["age".to_string()]));
    }

    #[test]
    fn s4_or_with_mixed_indexed_fields_does_not_push() {
        let mut age_gt = Document::new();
        age_gt.insert("$gt".into(), Value::Int(18));
        let mut age_lt = Document::new();
        age_lt.insert("$lt".into(), Value::Int(42));
        let mut and_body = Document::new();
        and_body.insert(
            "$and".into(),
            Value::List(vec![
                Value::Map(q(&[("age", Value::Map(age_gt))])),
                Value::Map(q(&[("age", Value::Map(age_lt))])),
            ]),
        );

        let mut or_body = Document::new();
        or_body.insert(
            "$or".into(),
            Value::List(vec![
                Value::Map(q(&[("name", Value::Text("Mario".into()))])),
                Value::Map(q(&[("name", Value::Text("Luigi".into()))])),
                Value::Map(and_body),
            ]),
        );

        let predicate = parse_query(&or_body).unwrap();
        let compiled = compile("users", &idx(&["name"]), predicate, &Projection::None, None);
        assert_eq!(compiled.sql, "SELECT _data FROM users");
    }

    #[test]
    fn s5_implicit_and_on_indexed_field() {
        let mut ops = Document::new();
        ops.insert("$gt".into(), Value::Int(18));
        ops.insert("$lt".into(), Value::Int(42));
        let mapping = q(&[("age", Value::Map(ops))]);
        let predicate = parse_query(&mapping).unwrap();
        let compiled = compile("users", &idx(&["age"]), predicate, &Projection::None, None);
        assert!(compiled.sql.contains(r#""age" > 18"#));
        assert!(compiled.sql.contains(r#""age" < 42"#));
        assert!(compiled.sql.contains(" AND "));
        assert!(residual_is_empty(&compiled.residual));
    }

    #[test]
    fn limit_is_suppressed_when_residual_remains() {
        let mapping = q(&[("score", Value::Int(5))]);
        let predicate = parse_query(&mapping).unwrap();
        let compiled = compile("users", &idx(&[]), predicate, &Projection::None, Some(1));
        assert!(!compiled.sql.contains("LIMIT"));
    }

    #[test]
    fn limit_applied_when_fully_pushed() {
        let mapping = q(&[("name", Value::Text("a".into()))]);
        let predicate = parse_query(&mapping).unwrap();
        let compiled = compile("users", &idx(&["name"]), predicate, &Projection::None, Some(1));
        assert!(compiled.sql.ends_with(" LIMIT 1"));
    }
}
