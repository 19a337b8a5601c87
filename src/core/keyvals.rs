//! `key=value` text codec for ethogram definitions and observation records.
//!
//! A record is written as space-separated `key=value` pairs. Special characters
//! are escaped with a backslash:
//!
//! - keys: whitespace, `=`, `\`, `"`
//! - values: whitespace, `,`, `\`, `"`
//!
//! A value holding an unescaped comma decodes to a tuple of strings split at the
//! commas; otherwise it decodes to a scalar string. Either side of a pair may also
//! be written as a double-quoted span, inside which only `"` and `\` need escaping
//! and which always decodes to a scalar.
//!
//! A trailing unescaped comma closes a tuple without adding an empty element, so
//! `a,` is the 1-tuple `("a",)`, `a,,` is `("a", "")` and `a,b,` is `("a", "b")`.
//! This keeps every non-empty tuple round-trippable; a plain split at commas
//! could not tell `("a",)` from `("a", "")`.

use crate::core::error::TinbergenError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// A decoded value: a plain string or a tuple of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    Tuple(Vec<String>),
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) => Some(s),
            FieldValue::Tuple(_) => None,
        }
    }

    /// Elements as a list; a scalar is a one-element list.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            FieldValue::Scalar(s) => vec![s.clone()],
            FieldValue::Tuple(items) => items.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::Tuple(value)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(value: Vec<&str>) -> Self {
        FieldValue::Tuple(value.into_iter().map(str::to_string).collect())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Scalar(s) => f.write_str(s),
            FieldValue::Tuple(items) => write!(f, "({})", items.join(", ")),
        }
    }
}

pub type Record = BTreeMap<String, FieldValue>;

fn escape_into(out: &mut String, raw: &str, special: &[char]) {
    for ch in raw.chars() {
        if ch.is_whitespace() || special.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
}

fn encode_key(out: &mut String, key: &str) {
    if key.is_empty() {
        out.push_str("\"\"");
    } else {
        escape_into(out, key, &['=', '\\', '"']);
    }
}

fn encode_value(out: &mut String, value: &FieldValue) {
    const SPECIAL: &[char] = &[',', '\\', '"'];
    match value {
        FieldValue::Scalar(s) => escape_into(out, s, SPECIAL),
        FieldValue::Tuple(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                escape_into(out, item, SPECIAL);
            }
            if items.len() == 1 || items.last().is_some_and(|s| s.is_empty()) {
                out.push(',');
            }
        }
    }
}

/// Render a record as `k1=v1 k2=v2 ...` in key order.
pub fn encode(record: &Record) -> String {
    let mut out = String::new();
    for (i, (key, value)) in record.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        encode_key(&mut out, key);
        out.push('=');
        encode_value(&mut out, value);
    }
    out
}

struct Scanner<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Scanner {
            text,
            chars: text.char_indices().peekable(),
        }
    }

    fn pos(&mut self) -> usize {
        self.chars.peek().map_or(self.text.len(), |&(i, _)| i)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.chars.next();
        }
    }

    fn at_boundary(&mut self) -> bool {
        self.peek().is_none_or(char::is_whitespace)
    }

    fn escaped(&mut self, backslash_at: usize) -> Result<char, TinbergenError> {
        self.chars
            .next()
            .map(|(_, c)| c)
            .ok_or_else(|| TinbergenError::parse(backslash_at, "dangling escape at end of input"))
    }

    fn quoted(&mut self) -> Result<String, TinbergenError> {
        let open = self.pos();
        self.chars.next();
        let mut out = String::new();
        while let Some((_, ch)) = self.chars.next() {
            match ch {
                '"' => return Ok(out),
                '\\' => match self.chars.next() {
                    Some((_, c)) => out.push(c),
                    None => break,
                },
                _ => out.push(ch),
            }
        }
        Err(TinbergenError::parse(
            open,
            format!("unterminated quote starting at {:?}", &self.text[open..]),
        ))
    }

    fn key(&mut self) -> Result<String, TinbergenError> {
        let start = self.pos();
        if self.peek() == Some('"') {
            return self.quoted();
        }
        let mut out = String::new();
        while let Some(&(i, ch)) = self.chars.peek() {
            if ch.is_whitespace() || ch == '=' {
                break;
            }
            self.chars.next();
            if ch == '\\' {
                out.push(self.escaped(i)?);
            } else {
                out.push(ch);
            }
        }
        if self.pos() == start {
            return Err(TinbergenError::parse(start, "'=' without a key"));
        }
        Ok(out)
    }

    fn value(&mut self) -> Result<FieldValue, TinbergenError> {
        if self.peek() == Some('"') {
            let s = self.quoted()?;
            if !self.at_boundary() {
                let pos = self.pos();
                return Err(TinbergenError::parse(
                    pos,
                    "quoted value must be followed by whitespace",
                ));
            }
            return Ok(FieldValue::Scalar(s));
        }
        let mut parts: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut trailing_comma = false;
        while let Some(&(i, ch)) = self.chars.peek() {
            if ch.is_whitespace() {
                break;
            }
            self.chars.next();
            match ch {
                '\\' => {
                    current.push(self.escaped(i)?);
                    trailing_comma = false;
                }
                ',' => {
                    parts.push(std::mem::take(&mut current));
                    trailing_comma = true;
                }
                _ => {
                    current.push(ch);
                    trailing_comma = false;
                }
            }
        }
        if parts.is_empty() && !trailing_comma {
            return Ok(FieldValue::Scalar(current));
        }
        if !trailing_comma {
            parts.push(current);
        }
        Ok(FieldValue::Tuple(parts))
    }
}

/// Parse `k1=v1 k2=v2 ...` into a record. Later duplicates of a key win.
///
/// Every whitespace-separated unit must be a `key=value` pair; a stray token,
/// an unterminated quote or a dangling escape is a `ParseError` carrying the
/// byte offset of the problem.
pub fn decode(text: &str) -> Result<Record, TinbergenError> {
    let mut scanner = Scanner::new(text);
    let mut record = Record::new();
    loop {
        scanner.skip_whitespace();
        if scanner.peek().is_none() {
            break;
        }
        let start = scanner.pos();
        let key = scanner.key()?;
        if scanner.peek() != Some('=') {
            let end = scanner.pos();
            return Err(TinbergenError::parse(
                start,
                format!("token {:?} is not a key=value pair", &text[start..end]),
            ));
        }
        scanner.chars.next();
        let value = scanner.value()?;
        record.insert(key, value);
    }
    Ok(record)
}

/// Split a `tag: rest` statement at the first colon, trimming both halves.
/// A line without a colon is all tag.
pub fn split_statement(line: &str) -> (&str, &str) {
    match line.split_once(':') {
        Some((head, tail)) => (head.trim(), tail.trim()),
        None => (line.trim(), ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pairs: &[(&str, FieldValue)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_encode_escapes_value_commas() {
        let r = rec(&[("value", "a,b".into())]);
        assert_eq!(encode(&r), r"value=a\,b");
    }

    #[test]
    fn test_encode_escapes_keys_and_joins_tuples() {
        let r = rec(&[
            ("my key", "x y".into()),
            ("values", vec!["sit", "stand up"].into()),
        ]);
        assert_eq!(encode(&r), r"my\ key=x\ y values=sit,stand\ up");
    }

    #[test]
    fn test_encode_marks_short_tuples_with_trailing_comma() {
        assert_eq!(encode(&rec(&[("a", vec!["x"].into())])), "a=x,");
        assert_eq!(encode(&rec(&[("a", vec!["x", ""].into())])), "a=x,,");
    }

    #[test]
    fn test_decode_unescaped_comma_makes_tuple() {
        let r = decode("value=a,b").unwrap();
        assert_eq!(r["value"], FieldValue::Tuple(vec!["a".into(), "b".into()]));
        let r = decode(r"value=a\,b").unwrap();
        assert_eq!(r["value"], FieldValue::Scalar("a,b".into()));
    }

    #[test]
    fn test_decode_trailing_comma_rules() {
        let r = decode("a=x, b=, c=,,").unwrap();
        assert_eq!(r["a"], FieldValue::Tuple(vec!["x".into()]));
        assert_eq!(r["b"], FieldValue::Tuple(vec![String::new()]));
        assert_eq!(r["c"], FieldValue::Tuple(vec![String::new(), String::new()]));
    }

    #[test]
    fn test_decode_bare_key_is_empty_scalar() {
        let r = decode("b= c=x").unwrap();
        assert_eq!(r["b"], FieldValue::Scalar(String::new()));
        assert_eq!(decode("b=").unwrap()["b"], FieldValue::Scalar(String::new()));
    }

    #[test]
    fn test_decode_trailing_comma_adds_no_element() {
        // `a,b,` is two elements; a trailing empty element is written `a,b,,`.
        let r = decode("v=a,b, w=a,b,,").unwrap();
        assert_eq!(r["v"], FieldValue::Tuple(vec!["a".into(), "b".into()]));
        assert_eq!(
            r["w"],
            FieldValue::Tuple(vec!["a".into(), "b".into(), String::new()])
        );
        assert_eq!(encode(&rec(&[("w", r["w"].clone())])), "w=a,b,,");
    }

    #[test]
    fn test_decode_quoted_spans_are_literal_scalars() {
        let r = decode(r#""odd key"="a, b=c \"q\"" plain=v"#).unwrap();
        assert_eq!(r["odd key"], FieldValue::Scalar(r#"a, b=c "q""#.into()));
        assert_eq!(r["plain"], FieldValue::Scalar("v".into()));
    }

    #[test]
    fn test_decode_escaped_whitespace_and_equals_in_key() {
        let r = decode(r"entry=sym6\ 4 a\=b=c").unwrap();
        assert_eq!(r["entry"], FieldValue::Scalar("sym6 4".into()));
        assert_eq!(r["a=b"], FieldValue::Scalar("c".into()));
    }

    #[test]
    fn test_decode_value_may_hold_equals() {
        let r = decode("expr=x=1").unwrap();
        assert_eq!(r["expr"], FieldValue::Scalar("x=1".into()));
    }

    #[test]
    fn test_decode_rejects_stray_token() {
        let err = decode("name=x stray kind=moment").unwrap_err();
        match err {
            TinbergenError::ParseError { position, detail } => {
                assert_eq!(position, 7);
                assert!(detail.contains("stray"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_unterminated_quote() {
        let err = decode(r#"a="open"#).unwrap_err();
        assert!(matches!(err, TinbergenError::ParseError { position: 2, .. }));
    }

    #[test]
    fn test_decode_rejects_missing_key_and_dangling_escape() {
        assert!(matches!(
            decode("=v").unwrap_err(),
            TinbergenError::ParseError { position: 0, .. }
        ));
        assert!(matches!(
            decode(r"a=b\").unwrap_err(),
            TinbergenError::ParseError { position: 3, .. }
        ));
        assert!(matches!(
            decode(r#"a="q"x"#).unwrap_err(),
            TinbergenError::ParseError { position: 5, .. }
        ));
    }

    #[test]
    fn test_decode_empty_text_is_empty_record() {
        assert!(decode("   ").unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_preserves_shape() {
        let r = rec(&[
            ("", "empty key".into()),
            ("entry", "sym6 4".into()),
            ("quote", "\"lead".into()),
            ("one", vec!["x"].into()),
            ("blanks", vec!["", ""].into()),
            ("path", r"C:\dir\f".into()),
            ("tab", "a\tb".into()),
        ]);
        assert_eq!(decode(&encode(&r)).unwrap(), r);
    }

    #[test]
    fn test_split_statement() {
        assert_eq!(split_statement(" obs : time=1 "), ("obs", "time=1"));
        assert_eq!(split_statement("name: My: Ethogram"), ("name", "My: Ethogram"));
        assert_eq!(split_statement("orphan"), ("orphan", ""));
    }
}
