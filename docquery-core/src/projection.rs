//! Projection construction from comma separated field lists.
//!
//! A projection controls which parts of a matched document are returned. Callers
//! describe it as plain text (`"address.city, firstName"`) plus a loosely-typed
//! flag saying whether the `_id` field should come back too.
//!
//! # Example
//!
//! ```ignore
//! use docquery::projection::{build_projection, IdentifierFlag};
//!
//! let projection = build_projection("address.city, firstName", IdentifierFlag::from("False"))?;
//! // { "address.city": true, "firstName": true, "_id": false }
//! let document = projection.to_document();
//! ```

use bson::{Bson, Document};
use serde_json::Value;

use crate::{
    error::{QueryError, QueryResult},
    identifier::ID_FIELD,
};

/// Whether the identifier field should be part of a projection.
///
/// Automation callers hand the flag over as a real boolean, as a number, or as
/// text such as `"False"`. Each form is a distinct variant and
/// [`IdentifierFlag::resolve`] turns any of them into a boolean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierFlag {
    /// An actual boolean.
    Bool(bool),
    /// A decimal digit token. Any digit token means "include".
    Digits(String),
    /// Free text. Only `false` (any case) means "exclude".
    Text(String),
}

impl IdentifierFlag {
    /// Classifies a textual token as either [`IdentifierFlag::Digits`] or [`IdentifierFlag::Text`].
    pub fn token(token: impl Into<String>) -> Self {
        let token = token.into();
        if is_digit_token(&token) {
            IdentifierFlag::Digits(token)
        } else {
            IdentifierFlag::Text(token)
        }
    }

    /// Resolves the flag into a boolean.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Config`] for a [`IdentifierFlag::Digits`] value that
    /// does not actually hold a digit token.
    pub fn resolve(&self) -> QueryResult<bool> {
        match self {
            IdentifierFlag::Bool(include) => Ok(*include),
            IdentifierFlag::Digits(token) if is_digit_token(token) => Ok(true),
            IdentifierFlag::Digits(token) => Err(QueryError::Config {
                flag: token.clone(),
            }),
            IdentifierFlag::Text(token) => Ok(!token.trim().eq_ignore_ascii_case("false")),
        }
    }
}

fn is_digit_token(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

impl Default for IdentifierFlag {
    fn default() -> Self {
        IdentifierFlag::Bool(true)
    }
}

impl From<bool> for IdentifierFlag {
    fn from(include: bool) -> Self {
        IdentifierFlag::Bool(include)
    }
}

impl From<&str> for IdentifierFlag {
    fn from(token: &str) -> Self {
        IdentifierFlag::token(token)
    }
}

impl From<String> for IdentifierFlag {
    fn from(token: String) -> Self {
        IdentifierFlag::token(token)
    }
}

impl TryFrom<&Value> for IdentifierFlag {
    type Error = QueryError;

    /// Classifies a flag that arrived as a JSON value.
    ///
    /// Booleans, strings and non-negative integers are accepted. Anything else
    /// has no sensible boolean reading and is rejected.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(include) => Ok(IdentifierFlag::Bool(*include)),
            Value::String(token) => Ok(IdentifierFlag::token(token.as_str())),
            Value::Number(n) if n.is_u64() => Ok(IdentifierFlag::Digits(n.to_string())),
            other => Err(QueryError::Config {
                flag: other.to_string(),
            }),
        }
    }
}

/// An ordered mapping from field path to include (`true`) or exclude (`false`).
///
/// Entries keep insertion order because some stores report projected fields in
/// specification order. Setting a path twice keeps its first position and the
/// last value. Mixed polarity is passed through as is; the store decides
/// whether it accepts it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionSpec {
    fields: Vec<(String, bool)>,
}

impl ProjectionSpec {
    /// Creates an empty projection, meaning "return whole documents".
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a projection builder for fluent construction.
    pub fn builder() -> ProjectionBuilder {
        ProjectionBuilder::new()
    }

    /// Sets a path to include or exclude.
    pub fn set(&mut self, path: impl Into<String>, include: bool) {
        let path = path.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == path) {
            Some(entry) => entry.1 = include,
            None => self.fields.push((path, include)),
        }
    }

    pub fn get(&self, path: &str) -> Option<bool> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == path)
            .map(|(_, include)| *include)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.fields.iter().map(|(path, include)| (path.as_str(), *include))
    }

    /// Converts the projection into the driver's projection document.
    ///
    /// Returns `None` for an empty projection so that no restriction is sent.
    pub fn to_document(&self) -> Option<Document> {
        if self.is_empty() {
            return None;
        }

        Some(
            self.fields
                .iter()
                .map(|(path, include)| (path.clone(), Bson::Boolean(*include)))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectionBuilder {
    spec: ProjectionSpec,
}

impl ProjectionBuilder {
    /// Creates a new projection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Includes a field path.
    pub fn include(mut self, path: impl Into<String>) -> Self {
        self.spec.set(path, true);
        self
    }

    /// Excludes a field path.
    pub fn exclude(mut self, path: impl Into<String>) -> Self {
        self.spec.set(path, false);
        self
    }

    /// Sets whether the identifier field is returned.
    pub fn identifier(mut self, include: bool) -> Self {
        self.spec.set(ID_FIELD, include);
        self
    }

    /// Builds and returns the final projection.
    pub fn build(self) -> ProjectionSpec {
        self.spec
    }
}

/// Builds a projection from a comma separated list of field paths.
///
/// Each path is trimmed and included in listed order, and empty segments are
/// skipped. The identifier field is appended last with the resolved
/// `include_identifier` flag. A list with no paths yields an empty projection
/// and the flag is ignored.
///
/// # Arguments
///
/// * `fields` - Field paths, dot separated for nested fields (`address.city`)
/// * `include_identifier` - Whether `_id` is returned alongside the listed fields
///
/// # Errors
///
/// Returns [`QueryError::Config`] if the flag cannot be resolved.
pub fn build_projection(
    fields: &str,
    include_identifier: impl Into<IdentifierFlag>,
) -> QueryResult<ProjectionSpec> {
    let paths = fields
        .split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .collect::<Vec<_>>();

    if paths.is_empty() {
        return Ok(ProjectionSpec::new());
    }

    let include_identifier = include_identifier.into().resolve()?;

    Ok(paths
        .into_iter()
        .fold(ProjectionSpec::builder(), ProjectionBuilder::include)
        .identifier(include_identifier)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde_json::json;

    #[test]
    fn lists_fields_then_identifier_in_order() {
        let spec = build_projection("address.city, firstName", true).unwrap();

        assert_eq!(
            spec.iter().collect::<Vec<_>>(),
            vec![("address.city", true), ("firstName", true), ("_id", true)]
        );
    }

    #[test]
    fn false_token_excludes_identifier() {
        let spec = build_projection("firstName", "false").unwrap();

        assert_eq!(spec.get("firstName"), Some(true));
        assert_eq!(spec.get("_id"), Some(false));

        for token in ["False", "FALSE", " false "] {
            assert_eq!(build_projection("firstName", token).unwrap().get("_id"), Some(false));
        }
    }

    #[test]
    fn other_tokens_include_identifier() {
        for flag in [
            IdentifierFlag::from("True"),
            IdentifierFlag::from("yes"),
            IdentifierFlag::from(""),
            IdentifierFlag::from("0"),
            IdentifierFlag::from("1"),
        ] {
            assert_eq!(build_projection("firstName", flag).unwrap().get("_id"), Some(true));
        }
        assert_eq!(build_projection("firstName", false).unwrap().get("_id"), Some(false));
    }

    #[test]
    fn empty_field_list_means_no_restriction() {
        for fields in ["", "   ", " , "] {
            let spec = build_projection(fields, false).unwrap();

            assert!(spec.is_empty());
            assert_eq!(spec.to_document(), None);
        }
    }

    #[test]
    fn empty_segments_are_skipped() {
        let spec = build_projection("a,,b,", true).unwrap();

        assert_eq!(spec.iter().map(|(path, _)| path).collect::<Vec<_>>(), vec!["a", "b", "_id"]);
    }

    #[test]
    fn listing_identifier_explicitly_keeps_its_position() {
        let spec = build_projection("_id, name", "false").unwrap();

        assert_eq!(spec.iter().collect::<Vec<_>>(), vec![("_id", false), ("name", true)]);
    }

    #[test]
    fn converts_to_projection_document() {
        let spec = build_projection("address.city", "0").unwrap();

        assert_eq!(spec.to_document(), Some(doc! { "address.city": true, "_id": true }));
    }

    #[test]
    fn builder_passes_mixed_polarity_through() {
        let spec = ProjectionSpec::builder().include("a").exclude("b").identifier(false).build();

        assert_eq!(spec.len(), 3);
        assert_eq!(spec.to_document(), Some(doc! { "a": true, "b": false, "_id": false }));
    }

    #[test]
    fn classifies_tokens() {
        assert_eq!(IdentifierFlag::from("42"), IdentifierFlag::Digits("42".into()));
        assert_eq!(IdentifierFlag::from("4x"), IdentifierFlag::Text("4x".into()));
    }

    #[test]
    fn bogus_digit_flag_is_a_config_error() {
        let err = build_projection("a", IdentifierFlag::Digits("abc".into())).unwrap_err();

        assert!(matches!(err, QueryError::Config { flag } if flag == "abc"));
    }

    #[test]
    fn flags_from_json_values() {
        assert_eq!(IdentifierFlag::try_from(&json!(false)).unwrap(), IdentifierFlag::Bool(false));
        assert_eq!(IdentifierFlag::try_from(&json!("False")).unwrap(), IdentifierFlag::Text("False".into()));
        assert_eq!(IdentifierFlag::try_from(&json!(0)).unwrap(), IdentifierFlag::Digits("0".into()));

        for value in [json!(null), json!(-1), json!(1.5), json!([true]), json!({"a": 1})] {
            assert!(matches!(IdentifierFlag::try_from(&value), Err(QueryError::Config { .. })));
        }
    }
}
