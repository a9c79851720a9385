//! Conversion from canonical JSON values into BSON documents.
//!
//! The literal parser produces [`serde_json::Value`] trees. The driver works on
//! [`bson::Document`], so this module maps one onto the other while keeping key
//! order intact.

use bson::{Bson, Document};
use serde_json::Value;

use crate::error::{QueryError, QueryResult};

/// Converts a canonical value into BSON.
///
/// Integers that fit in 32 bits become `Int32`, other signed integers `Int64`.
/// Unsigned integers beyond `i64::MAX` and all floating point numbers become `Double`.
pub fn to_bson(value: Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i32::try_from(i).map(Bson::Int32).unwrap_or(Bson::Int64(i)),
            None => n.as_f64().map(Bson::Double).unwrap_or(Bson::Null),
        },
        Value::String(s) => Bson::String(s),
        Value::Array(items) => Bson::Array(items.into_iter().map(to_bson).collect()),
        Value::Object(map) => Bson::Document(
            map.into_iter()
                .map(|(k, v)| (k, to_bson(v)))
                .collect(),
        ),
    }
}

/// Converts a canonical value that must be an object into a document.
///
/// # Errors
///
/// Returns [`QueryError::InvalidDocument`] if the value is not an object.
pub fn to_document(value: Value) -> QueryResult<Document> {
    match to_bson(value) {
        Bson::Document(document) => Ok(document),
        other => Err(QueryError::InvalidDocument(format!(
            "expected a document, found {other}"
        ))),
    }
}

/// Converts a canonical value that must be an array of objects into documents.
pub fn to_documents(value: Value) -> QueryResult<Vec<Document>> {
    match value {
        Value::Array(items) => items.into_iter().map(to_document).collect(),
        other => Err(QueryError::InvalidDocument(format!(
            "expected an array of documents, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde_json::json;

    #[test]
    fn integers_pick_the_narrowest_width() {
        assert_eq!(to_bson(json!(7)), Bson::Int32(7));
        assert_eq!(to_bson(json!(5_000_000_000i64)), Bson::Int64(5_000_000_000));
        assert_eq!(to_bson(json!(u64::MAX)), Bson::Double(u64::MAX as f64));
        assert_eq!(to_bson(json!(1.5)), Bson::Double(1.5));
    }

    #[test]
    fn objects_keep_key_order() {
        let document = to_document(json!({"timestamp": 1, "msg": "Hello 1", "tags": ["a", null]})).unwrap();

        assert_eq!(document, doc! { "timestamp": 1, "msg": "Hello 1", "tags": ["a", Bson::Null] });
        assert_eq!(document.keys().collect::<Vec<_>>(), vec!["timestamp", "msg", "tags"]);
    }

    #[test]
    fn rejects_non_objects() {
        assert!(matches!(to_document(json!([1, 2])), Err(QueryError::InvalidDocument(_))));
        assert!(matches!(to_documents(json!({"a": 1})), Err(QueryError::InvalidDocument(_))));
    }
}
