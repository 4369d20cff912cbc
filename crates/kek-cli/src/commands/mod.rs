//! CLI command handlers.

pub mod create;
pub mod delete;
pub mod history;
pub mod patch;
pub mod resource;
pub mod show;

use anyhow::Result;
use kek_collections::{Chain, Collection};
use serde_json::{Value, json};

/// JSON view of a collection, including whatever was hydrated or attached.
pub fn collection_json(col: &Collection) -> Result<Value> {
    let mut value = serde_json::to_value(col)?;
    let Some(obj) = value.as_object_mut() else {
        return Ok(value);
    };
    if !col.docs.is_empty() {
        obj.insert("docs".into(), serde_json::to_value(&col.docs)?);
    }
    if !col.collections.is_empty() {
        let nested = col
            .collections
            .values()
            .map(|c| -> Result<(String, Value)> { Ok((c.id.clone(), serde_json::to_value(c)?)) })
            .collect::<Result<serde_json::Map<_, _>>>()?;
        obj.insert("collections".into(), Value::Object(nested));
    }
    if let Some(chain) = &col.revisions {
        obj.insert("revisions".into(), chain_json(chain));
    }
    Ok(value)
}

pub fn chain_json(chain: &Chain) -> Value {
    chain
        .blocks
        .iter()
        .map(|block| {
            json!({
                "index": block.index,
                "hash": block.hash,
                "prev_hash": block.prev_hash,
                "timestamp_ns": block.timestamp_ns,
                "payload_bytes": block.payload.len(),
            })
        })
        .collect()
}
