//! Index definitions and the JSON structure persisted per collection in
//! `plume_master`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The shadow column's declared SQL type, mirroring the caller-supplied
/// primitive type tag one-to-one (`text` | `integer` | `real`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
        }
    }

    fn parse(s: &str) -> Option<SqlType> {
        match s {
            "TEXT" => Some(SqlType::Text),
            "INTEGER" => Some(SqlType::Integer),
            "REAL" => Some(SqlType::Real),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Asc
    }
}

impl Direction {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }

    fn parse(s: &str) -> Option<Direction> {
        match s {
            "ASC" => Some(Direction::Asc),
            "DESC" => Some(Direction::Desc),
            _ => None,
        }
    }
}

/// One key of an index definition: a normalized `(path, sql_type,
/// direction)` triple. Serializes as a 3-element JSON array, matching the
/// catalog row encoding in the external interfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexKey {
    pub field: String,
    pub sql_type: SqlType,
    pub direction: Direction,
}

impl IndexKey {
    pub fn new(field: impl Into<String>, sql_type: SqlType, direction: Direction) -> Self {
        IndexKey {
            field: field.into(),
            sql_type,
            direction,
        }
    }
}

impl Serialize for IndexKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeTuple;
        let mut tup = serializer.serialize_tuple(3)?;
        tup.serialize_element(&self.field)?;
        tup.serialize_element(self.sql_type.as_sql())?;
        tup.serialize_element(self.direction.as_str())?;
        tup.end()
    }
}

impl<'de> Deserialize<'de> for IndexKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (field, sql_type, direction): (String, String, String) =
            Deserialize::deserialize(deserializer)?;
        let sql_type = SqlType::parse(&sql_type)
            .ok_or_else(|| D::Error::custom(format!("unknown sql_type {sql_type}")))?;
        let direction = Direction::parse(&direction)
            .ok_or_else(|| D::Error::custom(format!("unknown direction {direction}")))?;
        Ok(IndexKey {
            field,
            sql_type,
            direction,
        })
    }
}

/// A named, ordered list of index keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub keys: Vec<IndexKey>,
    pub name: String,
}

impl IndexDefinition {
    /// Default generated name: `{collection}_index_{field1}_{field2}_…`.
    pub fn default_name(collection: &str, keys: &[IndexKey]) -> String {
        let mut name = format!("{collection}_index");
        for key in keys {
            name.push('_');
            name.push_str(&key.field);
        }
        name
    }
}

/// The catalog's per-collection index bookkeeping, persisted as JSON in
/// `plume_master.indexes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexCatalog {
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
    #[serde(default)]
    pub indexed_fields: Vec<String>,
    #[serde(default)]
    pub formated_indexed_fields: Vec<String>,
}

impl IndexCatalog {
    /// True if an existing index already covers exactly this ordered key
    /// list (structural equality on the normalized triples). Stops at the
    /// first match — overlapping-but-reordered key sets are distinct.
    pub fn has_equivalent_index(&self, keys: &[IndexKey]) -> bool {
        self.indexes.iter().any(|idx| idx.keys == keys)
    }

    /// Registers a new index definition, extending `indexed_fields` and
    /// `formated_indexed_fields` with any newly-seen paths in first-seen
    /// order.
    pub fn add_index(&mut self, definition: IndexDefinition) {
        for key in &definition.keys {
            if !self.indexed_fields.contains(&key.field) {
                self.indexed_fields.push(key.field.clone());
                self.formated_indexed_fields
                    .push(plume_query::quote_ident(&key.field));
            }
        }
        self.indexes.push(definition);
    }
}

/// Accepts the caller-facing shortcut: a single index key given bare, or an
/// ordered list of keys for a compound index.
pub trait IntoIndexKeys {
    fn into_index_keys(self) -> Vec<IndexKey>;
}

impl IntoIndexKeys for IndexKey {
    fn into_index_keys(self) -> Vec<IndexKey> {
        vec![self]
    }
}

impl IntoIndexKeys for Vec<IndexKey> {
    fn into_index_keys(self) -> Vec<IndexKey> {
        self
    }
}

impl IntoIndexKeys for &[IndexKey] {
    fn into_index_keys(self) -> Vec<IndexKey> {
        self.to_vec()
    }
}

impl<const N: usize> IntoIndexKeys for [IndexKey; N] {
    fn into_index_keys(self) -> Vec<IndexKey> {
        self.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_key_round_trips_through_json() {
        let key = IndexKey::new("name", SqlType::Text, Direction::Asc);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"["name","TEXT","ASC"]"#);
        let back: IndexKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn default_name_joins_fields() {
        let keys = vec![
            IndexKey::new("name", SqlType::Text, Direction::Asc),
            IndexKey::new("age", SqlType::Integer, Direction::Asc),
        ];
        assert_eq!(IndexDefinition::default_name("actors", &keys), "actors_index_name_age");
    }

    #[test]
    fn equivalent_index_detected_by_ordered_keys() {
        let mut catalog = IndexCatalog::default();
        let keys = vec![IndexKey::new("name", SqlType::Text, Direction::Asc)];
        catalog.add_index(IndexDefinition {
            keys: keys.clone(),
            name: "actors_index_name".into(),
        });
        assert!(catalog.has_equivalent_index(&keys));

        let reordered = vec![
            IndexKey::new("age", SqlType::Integer, Direction::Asc),
            IndexKey::new("name", SqlType::Text, Direction::Asc),
        ];
        assert!(!catalog.has_equivalent_index(&reordered));
    }

    #[test]
    fn empty_json_object_parses_as_default_catalog() {
        let catalog: IndexCatalog = serde_json::from_str("{}").unwrap();
        assert_eq!(catalog, IndexCatalog::default());
    }
}
