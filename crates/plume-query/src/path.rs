//! Dot-path access into [`Value::Map`] documents.
//!
//! An absent path is never an error: `get` returns `Value::Null`, `set`
//! creates missing intermediate maps, and `pop` on a missing prefix is a
//! no-op that returns `Value::Null`.

use crate::value::{Document, Value};

/// Splits a field path at every `.`. Segments are never empty by
/// construction of the query language, but an accidental empty segment
/// (`"a..b"`) is treated as "absent" rather than panicking.
fn segments(path: &str) -> Vec<&str> {
    path.split('.').collect()
}

/// Reads the value at `path` inside `doc`. Returns `Value::Null` if any
/// segment is missing or any intermediate value is not a map.
pub fn get(doc: &Value, path: &str) -> Value {
    let mut current = doc;
    for segment in segments(path) {
        match current.as_map().and_then(|m| m.get(segment)) {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    current.clone()
}

/// Writes `value` at `path` inside `doc`, creating intermediate maps as
/// needed. A no-op if an intermediate segment exists and is not a map.
pub fn set(doc: &mut Value, path: &str, value: Value) {
    let segs = segments(path);
    set_segments(doc, &segs, value);
}

fn set_segments(doc: &mut Value, segs: &[&str], value: Value) {
    let Some((head, rest)) = segs.split_first() else {
        return;
    };
    if !doc.is_map() {
        *doc = Value::Map(Document::new());
    }
    let map = doc.as_map_mut().expect("just coerced to a map");
    if rest.is_empty() {
        map.insert((*head).to_string(), value);
        return;
    }
    let child = map
        .entry((*head).to_string())
        .or_insert_with(|| Value::Map(Document::new()));
    if !child.is_map() {
        // Intermediate exists and isn't a map: no-op per Path Accessor contract.
        return;
    }
    set_segments(child, rest, value);
}

/// Removes and returns the value at `path`. Returns `Value::Null` if the
/// parent prefix does not exist or is not a map.
pub fn pop(doc: &mut Value, path: &str) -> Value {
    let segs = segments(path);
    pop_segments(doc, &segs)
}

fn pop_segments(doc: &mut Value, segs: &[&str]) -> Value {
    let Some((head, rest)) = segs.split_first() else {
        return Value::Null;
    };
    let Some(map) = doc.as_map_mut() else {
        return Value::Null;
    };
    if rest.is_empty() {
        return map.shift_remove(*head).unwrap_or(Value::Null);
    }
    match map.get_mut(*head) {
        Some(child) => pop_segments(child, rest),
        None => Value::Null,
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

    #[test]
    fn get_top_level() {
        let d = doc(&[("name", Value::Text("Alice".into()))]);
        assert_eq!(get(&d, "name"), Value::Text("Alice".into()));
    }

    #[test]
    fn get_missing_is_null() {
        let d = doc(&[("name", Value::Text("Alice".into()))]);
        assert_eq!(get(&d, "age"), Value::Null);
    }

    #[test]
    fn get_nested() {
        let mut d = Value::Map(Document::new());
        set(&mut d, "meta.social_media.mastodon_followers", Value::Int(42));
        assert_eq!(
            get(&d, "meta.social_media.mastodon_followers"),
            Value::Int(42)
        );
    }

    #[test]
    fn get_through_non_map_is_null() {
        let d = doc(&[("name", Value::Text("Alice".into()))]);
        assert_eq!(get(&d, "name.first"), Value::Null);
    }

    #[test]
    fn set_creates_intermediate_maps() {
        let mut d = Value::Map(Document::new());
        set(&mut d, "address.city", Value::Text("Austin".into()));
        let addr = get(&d, "address");
        assert!(addr.is_map());
        assert_eq!(get(&d, "address.city"), Value::Text("Austin".into()));
    }

    #[test]
    fn set_through_non_map_is_noop() {
        let mut d = doc(&[("name", Value::Text("Alice".into()))]);
        set(&mut d, "name.first", Value::Text("x".into()));
        assert_eq!(get(&d, "name"), Value::Text("Alice".into()));
        assert_eq!(get(&d, "name.first"), Value::Null);
    }

    #[test]
    fn pop_removes_and_returns() {
        let mut d = doc(&[("name", Value::Text("Alice".into()))]);
        let popped = pop(&mut d, "name");
        assert_eq!(popped, Value::Text("Alice".into()));
        assert_eq!(get(&d, "name"), Value::Null);
    }

    #[test]
    fn pop_missing_prefix_is_null_noop() {
        let mut d = doc(&[("name", Value::Text("Alice".into()))]);
        assert_eq!(pop(&mut d, "address.city"), Value::Null);
        assert_eq!(get(&d, "name"), Value::Text("Alice".into()));
    }

    #[test]
    fn pop_nested() {
        let mut d = Value::Map(Document::new());
        set(&mut d, "address.city", Value::Text("Austin".into()));
        set(&mut d, "address.state", Value::Text("TX".into()));
        let popped = pop(&mut d, "address.city");
        assert_eq!(popped, Value::Text("Austin".into()));
        assert_eq!(get(&d, "address.state"), Value::Text("TX".into()));
        assert_eq!(get(&d, "address.city"), Value::Null);
    }
}
