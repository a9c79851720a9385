//! Normalization of the reserved document identifier field.
//!
//! Query text can only carry the identifier as a string. The store, however,
//! matches `_id` against its native ObjectId type, so the string found under
//! that key has to be converted before the document reaches the driver.

use std::{fmt, str::FromStr};

use bson::{Bson, Document, oid::ObjectId};

use crate::error::{QueryError, QueryResult};

/// The reserved identifier key.
pub const ID_FIELD: &str = "_id";

/// The store's native document identifier.
///
/// A `DocumentId` can only be built from a token of exactly 24 hexadecimal
/// characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(ObjectId);

impl DocumentId {
    /// Parses a 24 character hexadecimal token.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Identifier`] if the token has the wrong length or
    /// contains a non-hexadecimal character.
    pub fn parse(token: &str) -> QueryResult<Self> {
        let invalid = || QueryError::Identifier {
            value: token.to_string(),
        };

        if token.len() != 24 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        ObjectId::parse_str(token).map(Self).map_err(|_| invalid())
    }

    pub fn object_id(&self) -> ObjectId {
        self.0
    }

    /// Returns the lowercase hexadecimal token.
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl FromStr for DocumentId {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<ObjectId> for DocumentId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl From<DocumentId> for Bson {
    fn from(id: DocumentId) -> Self {
        Bson::ObjectId(id.0)
    }
}

/// Rewrites the `_id` field of a document into a native identifier.
///
/// See [`normalize_identifier_key`].
pub fn normalize_identifier(document: Document) -> QueryResult<Document> {
    normalize_identifier_key(document, ID_FIELD)
}

/// Rewrites the string stored under `key` into a native identifier.
///
/// Documents without `key` are returned untouched, as are documents whose
/// identifier is already native. The field keeps its position in the document.
///
/// # Errors
///
/// Returns [`QueryError::Identifier`] if the field holds anything other than a
/// well-formed 24 character hexadecimal string. No partially rewritten document
/// is ever returned.
pub fn normalize_identifier_key(mut document: Document, key: &str) -> QueryResult<Document> {
    let id = match document.get(key) {
        None | Some(Bson::ObjectId(_)) => return Ok(document),
        Some(Bson::String(token)) => DocumentId::parse(token)?,
        Some(other) => {
            return Err(QueryError::Identifier {
                value: other.to_string(),
            });
        }
    };

    document.insert(key, id);

    Ok(document)
}
