//! JSON rendering of the object graph.
//!
//! Only owning edges are followed; `/Parent` back references are left out,
//! so the output is the tree a wire-format writer would see. Each textual
//! kind keeps its tag:
//!
//! | Object | JSON |
//! |---|---|
//! | name | `"/Type"` |
//! | literal string | `{"literal": "text"}` |
//! | hex string | `{"hex": "48656C6C6F"}` |
//! | date | `{"date": "D:20240101000000Z00"}` |

use serde_json::{json, Map, Number, Value};

use crate::error::{Error, Result};
use crate::model::{Dictionary, Document, Object, StringKind};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a document's object graph to JSON.
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    let value = dictionary_to_value(&doc.objects())?;
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(&value),
        JsonFormat::Compact => serde_json::to_string(&value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Convert one object (and everything it owns) to a JSON value.
///
/// Returns `None` for back references.
pub fn object_to_value(object: &Object) -> Result<Option<Value>> {
    let value = match object {
        Object::Null => Value::Null,
        Object::Boolean(b) => Value::Bool(*b),
        Object::Integer(n) => Value::from(*n),
        Object::Real(n) => Number::from_f64(*n)
            .map(Value::Number)
            .ok_or_else(|| Error::Render(format!("real {} has no JSON form", n)))?,
        Object::Name(name) => Value::String(name.to_string()),
        Object::String(s) => match s.kind() {
            StringKind::Literal => json!({ "literal": s.to_text() }),
            StringKind::Hex => json!({ "hex": s.to_hex_digits() }),
        },
        Object::Date(date) => json!({ "date": date.to_pdf_string() }),
        Object::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                if let Some(value) = object_to_value(item)? {
                    values.push(value);
                }
            }
            Value::Array(values)
        }
        Object::Dictionary(dict) => dictionary_to_value(dict)?,
        Object::Reference(reference) => dictionary_to_value(&reference.borrow())?,
        Object::BackReference(_) => return Ok(None),
    };
    Ok(Some(value))
}

fn dictionary_to_value(dict: &Dictionary) -> Result<Value> {
    let mut map = Map::new();
    for (key, value) in dict.iter() {
        if let Some(value) = object_to_value(value)? {
            map.insert(key.as_str().to_string(), value);
        }
    }
    Ok(Value::Object(map))
}
