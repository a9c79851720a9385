//! Rendering of matched documents for callers.
//!
//! Results come back either as the documents themselves or as one raw string.
//! The raw string is the concatenation of every document's key/value pair list
//! with nothing between documents. Callers check it with substring containment
//! (for example `'timestamp', 1` or `'4dacab2d52dfbd26f1000000'`), so the
//! rendering below must stay stable.

use std::fmt;

use bson::{Bson, Document};
use chrono::SecondsFormat;

/// Selects how matched documents are handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultMode {
    /// The documents themselves, in store order.
    Structured,
    /// One undelimited string built from every document's pair list.
    #[default]
    Raw,
}

/// Output of the result serializer.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Documents(Vec<Document>),
    Raw(String),
}

impl QueryOutput {
    pub fn into_documents(self) -> Option<Vec<Document>> {
        match self {
            QueryOutput::Documents(documents) => Some(documents),
            QueryOutput::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            QueryOutput::Raw(raw) => Some(raw),
            QueryOutput::Documents(_) => None,
        }
    }
}

/// Serializes matched documents according to `mode`.
///
/// The records are consumed exactly once. In [`ResultMode::Structured`] they
/// are collected unchanged and in order. In [`ResultMode::Raw`] each
/// document's pair list is appended with no separator, so document boundaries
/// are not marked and an empty input renders as an empty string.
pub fn serialize(records: impl IntoIterator<Item = Document>, mode: ResultMode) -> QueryOutput {
    match mode {
        ResultMode::Structured => QueryOutput::Documents(records.into_iter().collect()),
        ResultMode::Raw => QueryOutput::Raw(
            records
                .into_iter()
                .map(|document| render_pairs(&document))
                .collect(),
        ),
    }
}

/// Renders one document as its ordered pair list, e.g. `[('name', 'Clark'), ('age', 30)]`.
pub fn render_pairs(document: &Document) -> String {
    PairList(document).to_string()
}

struct PairList<'a>(&'a Document);

impl fmt::Display for PairList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "({}, {})", Quoted(key), Repr(value))?;
        }
        f.write_str("]")
    }
}

struct Repr<'a>(&'a Bson);

impl fmt::Display for Repr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Bson::Null => f.write_str("None"),
            Bson::Boolean(true) => f.write_str("True"),
            Bson::Boolean(false) => f.write_str("False"),
            Bson::Int32(i) => write!(f, "{i}"),
            Bson::Int64(i) => write!(f, "{i}"),
            Bson::Double(d) => f.write_str(&float_repr(*d)),
            Bson::String(s) => write!(f, "{}", Quoted(s)),
            Bson::ObjectId(oid) => write!(f, "ObjectId('{}')", oid.to_hex()),
            Bson::DateTime(dt) => write!(
                f,
                "datetime('{}')",
                dt.to_chrono().to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
            Bson::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", Repr(item))?;
                }
                f.write_str("]")
            }
            Bson::Document(document) => {
                f.write_str("{")?;
                for (i, (key, value)) in document.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", Quoted(key), Repr(value))?;
                }
                f.write_str("}")
            }
            other => write!(f, "{other}"),
        }
    }
}

/// Formats a double the way a Python float prints: whole numbers keep `.0`,
/// exponents carry a sign and at least two digits (`1e+20`, `1.5e-07`).
fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".into();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.into();
    }

    // Debug switches to exponent form at the same magnitudes Python does.
    let text = format!("{value:?}");
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => text,
    }
}

/// A quoted string. Single quotes unless the text holds a single quote and no double quote.
struct Quoted<'a>(&'a str);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quote = if self.0.contains('\'') && !self.0.contains('"') {
            '"'
        } else {
            '\''
        };

        write!(f, "{quote}")?;
        for c in self.0.chars() {
            match c {
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                '\t' => f.write_str("\\t")?,
                c if c == quote => write!(f, "\\{c}")?,
                c if c.is_control() => write!(f, "\\x{:02x}", c as u32)?,
                c => write!(f, "{c}")?,
            }
        }
        write!(f, "{quote}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{DateTime, doc, oid::ObjectId};

    fn clark() -> Document {
        doc! {
            "firstName": "Clark",
            "address": { "streetAddress": "21 2nd Street", "city": "Metropolis" },
        }
    }

    #[test]
    fn raw_mode_of_nothing_is_empty() {
        assert_eq!(serialize(Vec::new(), ResultMode::Raw), QueryOutput::Raw(String::new()));
    }

    #[test]
    fn raw_mode_concatenates_without_separator() {
        let first = doc! { "timestamp": 1, "msg": "Hello 1" };
        let second = doc! { "timestamp": 2, "msg": "Hello 2" };

        let output = serialize(vec![first.clone(), second.clone()], ResultMode::Raw);

        assert_eq!(
            output.as_raw().unwrap(),
            format!("{}{}", render_pairs(&first), render_pairs(&second))
        );
        assert_eq!(
            output.as_raw().unwrap(),
            "[('timestamp', 1), ('msg', 'Hello 1')][('timestamp', 2), ('msg', 'Hello 2')]"
        );
    }

    #[test]
    fn structured_mode_returns_documents_in_order() {
        let first = doc! { "n": 1 };
        let second = doc! { "n": 2 };

        let output = serialize(vec![first.clone(), second.clone()], ResultMode::Structured);

        assert_eq!(output.into_documents(), Some(vec![first, second]));
    }

    #[test]
    fn renders_nested_values() {
        assert_eq!(
            render_pairs(&clark()),
            "[('firstName', 'Clark'), ('address', {'streetAddress': '21 2nd Street', 'city': 'Metropolis'})]"
        );
    }

    #[test]
    fn renders_scalars_for_substring_checks() {
        let oid = ObjectId::parse_str("4dacab2d52dfbd26f1000000").unwrap();
        let document = doc! {
            "_id": oid,
            "ratio": 1.0,
            "big": 5_000_000_000i64,
            "in_use": false,
            "owner": Bson::Null,
            "tags": ["a", 2.5],
        };

        let raw = render_pairs(&document);

        assert!(raw.contains("'4dacab2d52dfbd26f1000000'"));
        assert_eq!(
            raw,
            "[('_id', ObjectId('4dacab2d52dfbd26f1000000')), ('ratio', 1.0), ('big', 5000000000), \
             ('in_use', False), ('owner', None), ('tags', ['a', 2.5])]"
        );
    }

    #[test]
    fn quotes_strings_like_literals() {
        let document = doc! { "a": "it's", "b": "say \"hi\"", "c": "both ' \"", "d": "line\nbreak" };

        assert_eq!(
            render_pairs(&document),
            r#"[('a', "it's"), ('b', 'say "hi"'), ('c', 'both \' "'), ('d', 'line\nbreak')]"#
        );
    }

    #[test]
    fn renders_datetimes() {
        let document = doc! { "at": DateTime::from_millis(0) };

        assert_eq!(render_pairs(&document), "[('at', datetime('1970-01-01T00:00:00.000Z'))]");
    }

    #[test]
    fn raw_is_the_default_mode() {
        assert_eq!(ResultMode::default(), ResultMode::Raw);
    }

    #[test]
    fn renders_doubles_like_python_floats() {
        let document = doc! {
            "whole": 3.0,
            "big": 1e20,
            "tiny": 1.5e-7,
            "edge": 1e16,
            "below": 1e15,
            "small": 0.0001,
            "negzero": -0.0,
            "nan": f64::NAN,
            "inf": f64::NEG_INFINITY,
        };

        assert_eq!(
            render_pairs(&document),
            "[('whole', 3.0), ('big', 1e+20), ('tiny', 1.5e-07), ('edge', 1e+16), \
             ('below', 1000000000000000.0), ('small', 0.0001), ('negzero', -0.0), \
             ('nan', nan), ('inf', -inf)]"
        );
    }
}
