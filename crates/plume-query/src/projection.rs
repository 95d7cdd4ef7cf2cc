use crate::error::QueryError;
use crate::path;
use crate::value::{Document, Value};

/// An inclusion or exclusion projection. Construction rejects mixing `1`
/// and `0` entries in the same mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    None,
    Include(Vec<String>),
    Exclude(Vec<String>),
}

impl Projection {
    /// Parses a caller-supplied `{path: 1 | 0, ...}` mapping.
    pub fn parse(mapping: &Document) -> Result<Projection, QueryError> {
        if mapping.is_empty() {
            return Ok(Projection::None);
        }
        let mut include = Vec::new();
        let mut exclude = Vec::new();
        for (path, flag) in mapping {
            if is_truthy(flag) {
                include.push(path.clone());
            } else {
                exclude.push(path.clone());
            }
        }
        match (include.is_empty(), exclude.is_empty()) {
            (false, true) => Ok(Projection::Include(include)),
            (true, false) => Ok(Projection::Exclude(exclude)),
            (false, false) => Err(QueryError::BadProjection(
                "projection cannot mix inclusion and exclusion entries".to_string(),
            )),
            (true, true) => Ok(Projection::None),
        }
    }

    pub fn include_fields(&self) -> &[String] {
        match self {
            Projection::Include(fields) => fields,
            _ => &[],
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Projection::None)
    }

    /// Applies the projection to a document, preserving nested structure.
    pub fn skim(&self, doc: &Value) -> Value {
        match self {
            Projection::None => doc.clone(),
            Projection::Include(fields) => {
                let mut result = Value::Map(Document::new());
                for field in fields {
                    let value = path::get(doc, field);
                    path::set(&mut result, field, value);
                }
                result
            }
            Projection::Exclude(fields) => {
                let mut result = doc.clone();
                for field in fields {
                    path::pop(&mut result, field);
                }
                result
            }
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Int(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::Bool(b) => *b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(pairs: &[(&str, Value)]) -> Value {
        let mut map = Document::new();
        for (k, v) in pairs {
            map.insert((*k).to_string(), v.clone());
        }
        Value::Map(map)
    }

    fn proj_map(pairs: &[(&str, i64)]) -> Document {
        let mut m = Document::new();
        for (k, v) in pairs {
            m.insert((*k).to_string(), Value::Int(*v));
        }
        m
    }

    #[test]
    fn mixing_include_and_exclude_is_bad_projection() {
        let m = proj_map(&[("name", 1), ("age", 0)]);
        assert!(matches!(Projection::parse(&m), Err(QueryError::BadProjection(_))));
    }

    #[test]
    fn include_only_keeps_named_paths() {
        let proj = Projection::parse(&proj_map(&[("name", 1)])).unwrap();
        let d = doc(&[
            ("name", Value::Text("Alice".into())),
            ("age", Value::Int(30)),
        ]);
        let skimmed = proj.skim(&d);
        assert_eq!(path::get(&skimmed, "name"), Value::Text("Alice".into()));
        assert_eq!(path::get(&skimmed, "age"), Value::Null);
    }

    #[test]
    fn exclude_only_removes_named_paths() {
        let proj = Projection::parse(&proj_map(&[("age", 0)])).unwrap();
        let d = doc(&[
            ("name", Value::Text("Alice".into())),
            ("age", Value::Int(30)),
        ]);
        let skimmed = proj.skim(&d);
        assert_eq!(path::get(&skimmed, "name"), Value::Text("Alice".into()));
        assert_eq!(path::get(&skimmed, "age"), Value::Null);
    }

    #[test]
    fn empty_projection_is_identity() {
        let proj = Projection::parse(&Document::new()).unwrap();
        assert_eq!(proj, Projection::None);
        let d = doc(&[("name", Value::Text("Alice".into()))]);
        assert_eq!(proj.skim(&d), d);
    }

    #[test]
    fn nested_include_preserves_structure() {
        let mut d = Value::Map(Document::new());
        path::set(&mut d, "address.city", Value::Text("Austin".into()));
        path::set(&mut d, "address.state", Value::Text("TX".into()));
        path::set(&mut d, "name", Value::Text("Alice".into()));

        let proj = Projection::parse(&proj_map(&[("address.city", 1)])).unwrap();
        let skimmed = proj.skim(&d);
        assert_eq!(path::get(&skimmed, "address.city"), Value::Text("Austin".into()));
        assert_eq!(path::get(&skimmed, "address.state"), Value::Null);
        assert_eq!(path::get(&skimmed, "name"), Value::Null);
    }
}
