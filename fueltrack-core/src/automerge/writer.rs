//! Writes JSON field maps into Automerge documents.

use automerge::{transaction::Transactable, AutoCommit, ObjId, ObjType, ScalarValue, ROOT};
use serde_json::Value;

use crate::store::Fields;

/// Writes every field of `fields` at the document root, replacing whatever
/// those keys held before. Keys not in `fields` are left alone.
pub fn write_fields(doc: &mut AutoCommit, fields: &Fields) -> Result<(), automerge::AutomergeError> {
    for (key, value) in fields {
        put_value(doc, &ROOT, key, value)?;
    }
    Ok(())
}

fn put_value(
    doc: &mut AutoCommit,
    obj: &ObjId,
    key: &str,
    value: &Value,
) -> Result<(), automerge::AutomergeError> {
    match value {
        Value::Object(map) => {
            let map_id = doc.put_object(obj, key, ObjType::Map)?;
            for (child_key, child) in map {
                put_value(doc, &map_id, child_key, child)?;
            }
        }
        Value::Array(items) => {
            let list_id = doc.put_object(obj, key, ObjType::List)?;
            for (i, item) in items.iter().enumerate() {
                insert_value(doc, &list_id, i, item)?;
            }
        }
        scalar => doc.put(obj, key, to_scalar(scalar))?,
    }
    Ok(())
}

fn insert_value(
    doc: &mut AutoCommit,
    list: &ObjId,
    index: usize,
    value: &Value,
) -> Result<(), automerge::AutomergeError> {
    match value {
        Value::Object(map) => {
            let map_id = doc.insert_object(list, index, ObjType::Map)?;
            for (child_key, child) in map {
                put_value(doc, &map_id, child_key, child)?;
            }
        }
        Value::Array(items) => {
            let list_id = doc.insert_object(list, index, ObjType::List)?;
            for (i, item) in items.iter().enumerate() {
                insert_value(doc, &list_id, i, item)?;
            }
        }
        scalar => doc.insert(list, index, to_scalar(scalar))?,
    }
    Ok(())
}

fn to_scalar(value: &Value) -> ScalarValue {
    match value {
        Value::Bool(b) => ScalarValue::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                ScalarValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                ScalarValue::Uint(u)
            } else {
                ScalarValue::F64(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => ScalarValue::from(s.as_str()),
        // Containers are handled by the callers
        Value::Null | Value::Array(_) | Value::Object(_) => ScalarValue::Null,
    }
}
