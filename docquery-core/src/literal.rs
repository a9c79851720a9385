//! Permissive literal parsing for hand-written query text.
//!
//! Query criteria, update bodies and records arrive as text that mixes strict
//! JSON with a looser literal style: single-quoted strings and keys, and
//! `true`/`false`/`null` in any letter case. Parsing happens in two passes:
//!
//! 1. A tolerant grammar reads the text into an intermediate literal tree. The
//!    grammar deliberately accepts a few constructs that have no JSON
//!    counterpart (tuples, sets, byte strings, non-string keys).
//! 2. The tree is re-encoded as strict JSON and decoded again. Anything that
//!    cannot survive that round trip is rejected, so callers only ever see a
//!    clean [`Value`].
//!
//! # Example
//!
//! ```ignore
//! use docquery::literal::parse;
//!
//! let loose = parse("{'in_use': TRUE, 'owner': Null}")?;
//! let strict = parse(r#"{"in_use": true, "owner": null}"#)?;
//! assert_eq!(loose, strict);
//! ```

use bson::Document;
use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;

use crate::{
    document::{to_document, to_documents},
    error::{QueryError, QueryResult},
};

/// Nesting limit for arrays, objects and tuples. Kept below the decoder's own
/// recursion limit so every tree accepted here can be re-decoded.
const MAX_DEPTH: usize = 100;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    Comma,
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::LBrace => "'{'".into(),
            Token::RBrace => "'}'".into(),
            Token::LBracket => "'['".into(),
            Token::RBracket => "']'".into(),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
            Token::Colon => "':'".into(),
            Token::Comma => "','".into(),
            Token::Null => "null".into(),
            Token::Bool(b) => b.to_string(),
            Token::Int(i) => i.to_string(),
            Token::UInt(u) => u.to_string(),
            Token::Float(f) => f.to_string(),
            Token::Str(_) => "string".into(),
            Token::Bytes(_) => "byte string".into(),
        }
    }
}

/// Splits literal text into tokens.
///
/// Bare words are only ever keywords. `true`, `false` and `null` match in any
/// case, `None` matches exactly. A word is always read to its end first, so a
/// keyword embedded in a longer identifier is never recognized.
struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.char_indices().peekable(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();

        while let Some(&(pos, ch)) = self.chars.peek() {
            let token = match ch {
                c if c.is_whitespace() => {
                    self.chars.next();
                    continue;
                }
                '{' => self.single(Token::LBrace),
                '}' => self.single(Token::RBrace),
                '[' => self.single(Token::LBracket),
                ']' => self.single(Token::RBracket),
                '(' => self.single(Token::LParen),
                ')' => self.single(Token::RParen),
                ':' => self.single(Token::Colon),
                ',' => self.single(Token::Comma),
                '\'' | '"' => {
                    self.chars.next();
                    Token::Str(self.string(ch)?)
                }
                '+' | '-' | '.' | '0'..='9' => self.number()?,
                c if c.is_alphabetic() || c == '_' => self.word()?,
                other => return Err(format!("unexpected character {other:?} at offset {pos}")),
            };
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn single(&mut self, token: Token) -> Token {
        self.chars.next();
        token
    }

    fn word(&mut self) -> Result<Token, String> {
        let mut word = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.chars.next();
            } else {
                break;
            }
        }

        if word.eq_ignore_ascii_case("b") {
            if let Some(&(_, quote @ ('\'' | '"'))) = self.chars.peek() {
                self.chars.next();
                return Ok(Token::Bytes(self.string(quote)?.into_bytes()));
            }
        }

        if word.eq_ignore_ascii_case("true") {
            Ok(Token::Bool(true))
        } else if word.eq_ignore_ascii_case("false") {
            Ok(Token::Bool(false))
        } else if word.eq_ignore_ascii_case("null") || word == "None" {
            Ok(Token::Null)
        } else {
            Err(format!("unexpected identifier '{word}'"))
        }
    }

    fn number(&mut self) -> Result<Token, String> {
        let mut text = String::new();
        let mut is_float = false;

        if let Some(&(_, sign @ ('+' | '-'))) = self.chars.peek() {
            text.push(sign);
            self.chars.next();
        }
        while let Some(&(_, c)) = self.chars.peek() {
            match c {
                '0'..='9' => text.push(c),
                '.' => {
                    is_float = true;
                    text.push(c);
                }
                'e' | 'E' => {
                    is_float = true;
                    text.push(c);
                    self.chars.next();
                    if let Some(&(_, sign @ ('+' | '-'))) = self.chars.peek() {
                        text.push(sign);
                    } else {
                        continue;
                    }
                }
                _ => break,
            }
            self.chars.next();
        }

        let digits = text.trim_start_matches(['+', '-']);
        if !digits.chars().any(|c| c.is_ascii_digit()) {
            return Err(format!("malformed number '{text}'"));
        }

        if !is_float {
            if let Ok(value) = text.parse::<i64>() {
                // JSON decoders read `-0` as a negative-zero float.
                if value == 0 && text.starts_with('-') {
                    return Ok(Token::Float(-0.0));
                }
                return Ok(Token::Int(value));
            }
            if let Ok(value) = digits.parse::<u64>() {
                if !text.starts_with('-') {
                    return Ok(Token::UInt(value));
                }
            }
        }

        text.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| format!("malformed number '{text}'"))
    }

    /// Reads a quoted string whose opening quote has already been consumed.
    fn string(&mut self, quote: char) -> Result<String, String> {
        let mut out = String::new();

        loop {
            let (_, c) = self
                .chars
                .next()
                .ok_or_else(|| "unterminated string".to_string())?;
            match c {
                c if c == quote => return Ok(out),
                '\n' => return Err("unterminated string".into()),
                '\\' => self.escape(&mut out)?,
                c => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), String> {
        let (_, c) = self
            .chars
            .next()
            .ok_or_else(|| "unterminated string".to_string())?;
        match c {
            '\\' | '\'' | '"' | '/' => out.push(c),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            '0' => out.push('\0'),
            'x' => {
                let code = self.hex(2)?;
                out.push(char::from_u32(code).ok_or("invalid \\x escape")?);
            }
            'u' => {
                let high = self.hex(4)?;
                let code = if (0xD800..0xDC00).contains(&high) {
                    let low = match (self.chars.next(), self.chars.next()) {
                        (Some((_, '\\')), Some((_, 'u'))) => self.hex(4)?,
                        _ => return Err("unpaired surrogate in \\u escape".into()),
                    };
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err("unpaired surrogate in \\u escape".into());
                    }
                    0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    high
                };
                out.push(char::from_u32(code).ok_or("unpaired surrogate in \\u escape")?);
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }

        Ok(())
    }

    fn hex(&mut self, len: usize) -> Result<u32, String> {
        let mut code = 0;
        for _ in 0..len {
            let digit = self
                .chars
                .next()
                .and_then(|(_, c)| c.to_digit(16))
                .ok_or_else(|| "truncated escape sequence".to_string())?;
            code = code * 16 + digit;
        }
        Ok(code)
    }
}

/// Tree produced by the tolerant grammar, before JSON canonicalization.
#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    Set(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    fn kind(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Bool(_) => "boolean",
            Literal::Int(_) | Literal::UInt(_) => "integer",
            Literal::Float(_) => "float",
            Literal::Str(_) => "string",
            Literal::Bytes(_) => "byte string",
            Literal::List(_) => "list",
            Literal::Tuple(_) => "tuple",
            Literal::Set(_) => "set",
            Literal::Dict(_) => "object",
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse(mut self) -> Result<Literal, String> {
        let literal = self.value(0)?;
        match self.tokens.get(self.pos) {
            None => Ok(literal),
            Some(token) => Err(format!("unexpected {} after value", token.describe())),
        }
    }

    fn next(&mut self) -> Result<Token, String> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| "unexpected end of input".to_string())?;
        self.pos += 1;
        Ok(token)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn value(&mut self, depth: usize) -> Result<Literal, String> {
        if depth > MAX_DEPTH {
            return Err(format!("nesting deeper than {MAX_DEPTH} levels"));
        }

        match self.next()? {
            Token::Null => Ok(Literal::Null),
            Token::Bool(b) => Ok(Literal::Bool(b)),
            Token::Int(i) => Ok(Literal::Int(i)),
            Token::UInt(u) => Ok(Literal::UInt(u)),
            Token::Float(f) => Ok(Literal::Float(f)),
            Token::Str(s) => Ok(Literal::Str(s)),
            Token::Bytes(b) => Ok(Literal::Bytes(b)),
            Token::LBracket => Ok(Literal::List(self.items(&Token::RBracket, depth)?)),
            Token::LParen => self.parenthesized(depth),
            Token::LBrace => self.braced(depth),
            other => Err(format!("unexpected {}", other.describe())),
        }
    }

    /// Comma-separated values up to `close`. Trailing commas are rejected.
    fn items(&mut self, close: &Token, depth: usize) -> Result<Vec<Literal>, String> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }

        loop {
            items.push(self.value(depth + 1)?);
            if self.eat(close) {
                return Ok(items);
            }
            match self.next()? {
                Token::Comma if self.peek() == Some(close) => {
                    return Err(format!("trailing comma before {}", close.describe()));
                }
                Token::Comma => continue,
                other => {
                    return Err(format!(
                        "expected ',' or {}, found {}",
                        close.describe(),
                        other.describe()
                    ));
                }
            }
        }
    }

    /// `(x)` is a grouped value, `()`, `(x,)` and `(x, y)` are tuples.
    fn parenthesized(&mut self, depth: usize) -> Result<Literal, String> {
        if self.eat(&Token::RParen) {
            return Ok(Literal::Tuple(Vec::new()));
        }

        let first = self.value(depth + 1)?;
        if self.eat(&Token::RParen) {
            return Ok(first);
        }
        if !self.eat(&Token::Comma) {
            return Err("expected ',' or ')' in tuple".into());
        }
        if self.eat(&Token::RParen) {
            return Ok(Literal::Tuple(vec![first]));
        }

        let mut items = vec![first];
        items.extend(self.items(&Token::RParen, depth)?);
        Ok(Literal::Tuple(items))
    }

    /// `{}` and `{k: v, ...}` are objects, `{a, b}` is a set.
    fn braced(&mut self, depth: usize) -> Result<Literal, String> {
        if self.eat(&Token::RBrace) {
            return Ok(Literal::Dict(Vec::new()));
        }

        let first = self.value(depth + 1)?;
        if !self.eat(&Token::Colon) {
            let mut items = vec![first];
            if self.eat(&Token::RBrace) {
                return Ok(Literal::Set(items));
            }
            if !self.eat(&Token::Comma) {
                return Err("expected ':' or ',' after object key".into());
            }
            items.extend(self.items(&Token::RBrace, depth)?);
            return Ok(Literal::Set(items));
        }

        let mut entries = vec![(first, self.value(depth + 1)?)];
        loop {
            match self.next()? {
                Token::RBrace => return Ok(Literal::Dict(entries)),
                Token::Comma if self.peek() == Some(&Token::RBrace) => {
                    return Err("trailing comma before '}'".into());
                }
                Token::Comma => {
                    let key = self.value(depth + 1)?;
                    if !self.eat(&Token::Colon) {
                        return Err("expected ':' after object key".into());
                    }
                    entries.push((key, self.value(depth + 1)?));
                }
                other => return Err(format!("expected ',' or '}}', found {}", other.describe())),
            }
        }
    }
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Literal::Null => serializer.serialize_unit(),
            Literal::Bool(b) => serializer.serialize_bool(*b),
            Literal::Int(i) => serializer.serialize_i64(*i),
            Literal::UInt(u) => serializer.serialize_u64(*u),
            Literal::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Literal::Float(f) => Err(S::Error::custom(format!("{f} is not a finite number"))),
            Literal::Str(s) => serializer.serialize_str(s),
            Literal::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Literal::Dict(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    match key {
                        Literal::Str(key) => map.serialize_entry(key, value)?,
                        other => {
                            return Err(S::Error::custom(format!(
                                "object keys must be strings, found {}",
                                other.kind()
                            )));
                        }
                    }
                }
                map.end()
            }
            other @ (Literal::Bytes(_) | Literal::Tuple(_) | Literal::Set(_)) => Err(
                S::Error::custom(format!("{} is not JSON-representable", other.kind())),
            ),
        }
    }
}

/// Parses hybrid literal text into a canonical JSON value.
///
/// # Errors
///
/// Returns [`QueryError::Parse`] when the text is not a valid literal or when
/// the literal holds anything without a JSON counterpart.
pub fn parse(text: &str) -> QueryResult<Value> {
    let literal = Lexer::new(text)
        .tokenize()
        .and_then(|tokens| Parser::new(tokens).parse())
        .map_err(|reason| {
            log::debug!("Rejected literal text {text:?}: {reason}");
            QueryError::parse(reason, text)
        })?;

    let encoded = serde_json::to_string(&literal)
        .map_err(|err| QueryError::parse(err.to_string(), text))?;

    serde_json::from_str(&encoded).map_err(|err| QueryError::parse(err.to_string(), text))
}

/// Parses literal text that must describe a single document.
pub fn parse_document(text: &str) -> QueryResult<Document> {
    to_document(parse(text)?)
}

/// Parses literal text that must describe an aggregation pipeline: an array of documents.
pub fn parse_pipeline(text: &str) -> QueryResult<Vec<Document>> {
    to_documents(parse(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loose_and_strict_forms_agree() {
        assert_eq!(
            parse("{'a': TRUE, 'b': Null, 'c': false}").unwrap(),
            parse(r#"{"a": true, "b": null, "c": false}"#).unwrap(),
        );
    }

    #[test]
    fn parses_nested_structures_in_order() {
        let value = parse(r#"{"z": [1, -2.5, 'x'], "a": {"$lt": 2}}"#).unwrap();

        assert_eq!(value, json!({"z": [1, -2.5, "x"], "a": {"$lt": 2}}));
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn mixed_quotes_allow_embedded_apostrophes() {
        let value = parse(r#"{'msg': "it's here", "quote": 'say "hi"'}"#).unwrap();

        assert_eq!(value["msg"], "it's here");
        assert_eq!(value["quote"], "say \"hi\"");
    }

    #[test]
    fn keywords_inside_strings_are_left_alone() {
        let value = parse("{'note': 'FALSE alarm, null result'}").unwrap();

        assert_eq!(value["note"], "FALSE alarm, null result");
    }

    #[test]
    fn keywords_must_be_whole_words() {
        assert!(parse("{'a': trueish}").is_err());
        assert!(parse("{'a': nullable}").is_err());
    }

    #[test]
    fn accepts_none_and_mixed_case_keywords() {
        assert_eq!(parse("[None, NULL, True, fAlSe]").unwrap(), json!([null, null, true, false]));
    }

    #[test]
    fn numbers_keep_integer_and_float_kinds() {
        let value = parse("[0, -7, +3, 1.0, .5, 2e3, 18446744073709551615]").unwrap();

        assert!(value[0].is_i64());
        assert_eq!(value[1], json!(-7));
        assert_eq!(value[2], json!(3));
        assert!(value[3].is_f64());
        assert_eq!(value[4], json!(0.5));
        assert_eq!(value[5], json!(2000.0));
        assert!(value[6].is_u64());
    }

    #[test]
    fn negative_zero_matches_the_json_decoder() {
        let value = parse("-0").unwrap();
        let decoded: Value = serde_json::from_str("-0").unwrap();

        assert!(value.is_f64());
        assert!(value.as_f64().unwrap().is_sign_negative());
        assert_eq!(value.is_f64(), decoded.is_f64());
        assert_eq!(parse("[0, +0]").unwrap(), json!([0, 0]));
        assert!(parse("[0]").unwrap()[0].is_i64());
    }

    #[test]
    fn decodes_escape_sequences() {
        let value = parse(r#"["a\nb", 'tab\there', "é😀", 'it\'s']"#).unwrap();

        assert_eq!(value, json!(["a\nb", "tab\there", "é😀", "it's"]));
    }

    #[test]
    fn rejects_malformed_text() {
        for text in ["{bad json", "", "{'a' 1}", "[1, 2", "{'a': 1,}", "[1,]", "{'a': 1} x", "// c"] {
            match parse(text) {
                Err(QueryError::Parse { text: original, .. }) => assert_eq!(original, text),
                other => panic!("expected parse error for {text:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_unquoted_keys() {
        assert!(parse("{name: 'Clark'}").is_err());
    }

    #[test]
    fn rejects_values_without_a_json_form() {
        for text in ["(1, 2)", "{'a': (1,)}", "{1, 2}", "b'raw'", "{1: 'one'}", "1e999"] {
            assert!(
                matches!(parse(text), Err(QueryError::Parse { .. })),
                "{text:?} should not parse"
            );
        }
    }

    #[test]
    fn grouping_parentheses_are_transparent() {
        assert_eq!(parse("{'a': (5)}").unwrap(), json!({"a": 5}));
    }

    #[test]
    fn rejects_excessive_nesting() {
        let text = format!("{}{}", "[".repeat(MAX_DEPTH + 2), "]".repeat(MAX_DEPTH + 2));

        assert!(parse(&text).is_err());
    }

    #[test]
    fn duplicate_keys_keep_first_position_and_last_value() {
        let value = parse("{'a': 1, 'b': 2, 'a': 3}").unwrap();

        assert_eq!(value, json!({"a": 3, "b": 2}));
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn parse_document_requires_an_object() {
        assert!(parse_document("{'a': 1}").is_ok());
        assert!(matches!(parse_document("[1]"), Err(QueryError::InvalidDocument(_))));
    }

    #[test]
    fn parse_pipeline_requires_documents() {
        let pipeline = parse_pipeline("[{'$match': {'a': 1}}, {'$limit': 2}]").unwrap();

        assert_eq!(pipeline.len(), 2);
        assert!(matches!(parse_pipeline("[{'$match': {}}, 3]"), Err(QueryError::InvalidDocument(_))));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            (-1_000_000i32..1_000_000).prop_map(|n| Value::from(f64::from(n) / 4.0)),
            "[ -~]{0,12}".prop_map(Value::from),
        ];
        leaf.prop_recursive(4, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::from),
                prop::collection::vec(("[a-z_$]{1,8}", inner), 0..6)
                    .prop_map(|entries| Value::Object(entries.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn strict_json_parses_like_serde_json(value in json_value()) {
            let text = serde_json::to_string(&value).unwrap();
            let direct: Value = serde_json::from_str(&text).unwrap();

            prop_assert_eq!(parse(&text).unwrap(), direct);
        }

        #[test]
        fn reparsing_the_json_encoding_is_idempotent(value in json_value()) {
            let first = parse(&serde_json::to_string(&value).unwrap()).unwrap();
            let second = parse(&serde_json::to_string(&first).unwrap()).unwrap();

            prop_assert_eq!(first, second);
        }
    }
}
