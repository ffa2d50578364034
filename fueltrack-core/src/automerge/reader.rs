//! Reads Automerge documents back into JSON field maps.

use automerge::{AutoCommit, ObjId, ObjType, ReadDoc, ScalarValue, Value as AmValue, ROOT};
use serde_json::{Map, Number, Value};

use crate::store::Fields;

/// Reads the root map of `doc` as a field map.
pub fn read_fields(doc: &AutoCommit) -> Result<Fields, automerge::AutomergeError> {
    read_map(doc, &ROOT)
}

fn read_map(doc: &AutoCommit, obj: &ObjId) -> Result<Map<String, Value>, automerge::AutomergeError> {
    let mut fields = Map::new();

    for key in doc.keys(obj) {
        if let Some((value, child_id)) = doc.get(obj, key.as_str())? {
            fields.insert(key, read_value(doc, value, &child_id)?);
        }
    }

    Ok(fields)
}

fn read_list(doc: &AutoCommit, obj: &ObjId) -> Result<Vec<Value>, automerge::AutomergeError> {
    let len = doc.length(obj);
    let mut items = Vec::with_capacity(len);

    for i in 0..len {
        if let Some((value, child_id)) = doc.get(obj, i)? {
            items.push(read_value(doc, value, &child_id)?);
        }
    }

    Ok(items)
}

fn read_value(
    doc: &AutoCommit,
    value: AmValue<'_>,
    obj: &ObjId,
) -> Result<Value, automerge::AutomergeError> {
    match value {
        AmValue::Object(ObjType::Map) | AmValue::Object(ObjType::Table) => {
            Ok(Value::Object(read_map(doc, obj)?))
        }
        AmValue::Object(ObjType::List) => Ok(Value::Array(read_list(doc, obj)?)),
        AmValue::Object(ObjType::Text) => Ok(Value::String(doc.text(obj)?)),
        AmValue::Scalar(scalar) => Ok(from_scalar(&scalar)),
    }
}

fn from_scalar(scalar: &ScalarValue) -> Value {
    match scalar {
        ScalarValue::Str(s) => Value::String(s.to_string()),
        ScalarValue::Int(i) | ScalarValue::Timestamp(i) => Value::from(*i),
        ScalarValue::Uint(u) => Value::from(*u),
        ScalarValue::F64(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        ScalarValue::Boolean(b) => Value::Bool(*b),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automerge::write_fields;
    use serde_json::json;

    #[test]
    fn test_reads_back_written_fields() {
        let fields = json!({
            "name": "Chicken",
            "calories": 320,
            "macros": { "protein": 40.5, "carbs": 0, "fats": 12 },
            "Lunch": [{ "name": "Rice", "servings": 2 }],
            "archived": false,
            "note": null,
        });

        let mut doc = AutoCommit::new();
        write_fields(&mut doc, fields.as_object().unwrap()).unwrap();

        let read = read_fields(&doc).unwrap();
        assert_eq!(Value::Object(read), fields);
    }

    #[test]
    fn test_empty_document() {
        let doc = AutoCommit::new();
        assert!(read_fields(&doc).unwrap().is_empty());
    }
}
