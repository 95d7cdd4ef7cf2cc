//! Encodes/decodes documents to the canonical JSON text stored in `_data`.

use plume_query::Value;

use crate::error::Result;

pub fn encode(doc: &Value) -> Result<String> {
    Ok(serde_json::to_string(doc)?)
}

pub fn decode(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(text)?)
}
