//! Query arguments and percent encoding.
//!
//! Arguments keep their insertion order and the first occurrence of a key wins, both when
//! parsing a query string and when inserting programmatically.

use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::protocol::ParseError;

/// Every byte except the unreserved characters `A-Z a-z 0-9 - _ ~ .` is encoded.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'~').remove(b'.');

/// Encodes `input` as `%XX` sequences with uppercase hex digits.
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, QUERY_COMPONENT).to_string()
}

/// Decodes `%XX` sequences in `input`.
///
/// A `%` not followed by two hex digits, or a decoded byte sequence that is not valid
/// UTF-8, is rejected.
pub fn percent_decode(input: &str) -> Result<String, ParseError> {
    let bytes = input.as_bytes();
    let mut index = 0;
    while let Some(offset) = bytes[index..].iter().position(|b| *b == b'%') {
        let start = index + offset;
        let valid = bytes.get(start + 1..start + 3).is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(ParseError::invalid_percent_encoding(format!("malformed escape in {input:?}")));
        }
        index = start + 3;
    }

    percent_decode_str(input)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ParseError::invalid_percent_encoding(e.to_string()))
}

/// Splits a raw request target into the resource path and the raw query string.
pub fn split_resource(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((resource, query)) => (resource, Some(query)),
        None => (target, None),
    }
}

/// Ordered query arguments of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryArgs {
    args: Vec<(String, String)>,
}

impl QueryArgs {
    pub fn new() -> Self {
        Default::default()
    }

    /// Parses a raw query string such as `a=1&b=x%20y&c`.
    ///
    /// Empty segments are skipped and a segment without `=` has an empty value.
    pub fn parse(query: &str) -> Result<Self, ParseError> {
        let mut args = Self::new();
        for segment in query.split('&').filter(|segment| !segment.is_empty()) {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            args.insert(percent_decode(key)?, percent_decode(value)?);
        }
        Ok(args)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.args.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts an argument unless the key is already present. Returns `true` if inserted.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.contains(&key) {
            return false;
        }
        self.args.push((key, value.into()));
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.args.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// Formats as `?k=v&k2=v2` with every key and value percent encoded, or nothing when empty.
impl fmt::Display for QueryArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (key, value)) in self.iter().enumerate() {
            let separator = if index == 0 { '?' } else { '&' };
            write!(f, "{separator}{}={}", percent_encode(key), percent_encode(value))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_unreserved_verbatim() {
        assert_eq!(percent_encode("azAZ09-_~."), "azAZ09-_~.");
        assert_eq!(percent_encode("a b/c?d"), "a%20b%2Fc%3Fd");
        assert_eq!(percent_encode("é"), "%C3%A9");
    }

    #[test]
    fn decode() {
        assert_eq!(percent_decode("v%20v").unwrap(), "v v");
        assert_eq!(percent_decode("%c3%A9").unwrap(), "é");
        assert_eq!(percent_decode("plain").unwrap(), "plain");
    }

    #[test]
    fn decode_malformed() {
        assert!(matches!(percent_decode("%"), Err(ParseError::InvalidPercentEncoding { .. })));
        assert!(matches!(percent_decode("ab%2"), Err(ParseError::InvalidPercentEncoding { .. })));
        assert!(matches!(percent_decode("%zz"), Err(ParseError::InvalidPercentEncoding { .. })));
        assert!(matches!(percent_decode("%FF"), Err(ParseError::InvalidPercentEncoding { .. })));
    }

    #[test]
    fn parse_query() {
        let args = QueryArgs::parse("a=v%20v&b").unwrap();

        assert_eq!(args.len(), 2);
        assert_eq!(args.get("a"), Some("v v"));
        assert_eq!(args.get("b"), Some(""));
        assert_eq!(args.get("c"), None);
    }

    #[test]
    fn parse_skips_empty_segments_and_keeps_first() {
        let args = QueryArgs::parse("&x=1&&x=2&y==3&").unwrap();

        assert_eq!(args.iter().collect::<Vec<_>>(), vec![("x", "1"), ("y", "=3")]);
    }

    #[test]
    fn split() {
        assert_eq!(split_resource("/e?a=1?b"), ("/e", Some("a=1?b")));
        assert_eq!(split_resource("/e"), ("/e", None));
        assert_eq!(split_resource("/e?"), ("/e", Some("")));
    }

    #[test]
    fn display() {
        let mut args = QueryArgs::new();
        assert_eq!(args.to_string(), "");

        args.insert("name", "a b");
        args.insert("k&", "=");
        assert!(!args.insert("name", "other"));

        assert_eq!(args.to_string(), "?name=a%20b&k%26=%3D");
        assert_eq!(QueryArgs::parse(&args.to_string()[1..]).unwrap(), args);
    }
}
