//! Composite authorization tokens
//!
//! A follow-up call (capture referencing an authorize, refund referencing a
//! purchase) often needs several provider identifiers at once. They are packed
//! positionally into one opaque string joined by [`DELIMITER`]; an absent field
//! is an empty segment so later positions stay aligned. An empty string is
//! indistinguishable from an absent field: `Some("")` decodes as `None`, and
//! the empty token decodes to no fields at all.
//!
//! Field values are not escaped. A value containing the delimiter splits into
//! extra segments on decode and shifts every later position. Tokens are handed
//! back to integrators and replayed later, so the delimiter can never change.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Reserved separator between token segments
pub const DELIMITER: char = '|';

/// Join optional fields into one token, keeping every position
pub fn encode<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut token = String::new();
    for (index, field) in fields.into_iter().enumerate() {
        if index > 0 {
            token.push(DELIMITER);
        }
        if let Some(value) = field {
            let value = value.as_ref();
            if value.contains(DELIMITER) {
                warn!(
                    position = index,
                    delimiter = %DELIMITER,
                    "authorization field contains the delimiter; decoded positions will shift"
                );
            }
            token.push_str(value);
        }
    }
    token
}

/// Split a token into its fields; empty segments decode as absent
pub fn decode(token: &str) -> Vec<Option<String>> {
    if token.is_empty() {
        return Vec::new();
    }
    token
        .split(DELIMITER)
        .map(|segment| (!segment.is_empty()).then(|| segment.to_string()))
        .collect()
}

/// Like [`decode`], padding missing trailing positions with `None`
///
/// Tokens issued before a trailing field was added are shorter than the
/// current schema; they still decode. Extra segments are kept.
pub fn decode_padded(token: &str, expected: usize) -> Vec<Option<String>> {
    let mut fields = decode(token);
    if fields.len() < expected {
        fields.resize(expected, None);
    }
    fields
}

/// Positional set of identifiers carried by one token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositeAuthorization {
    fields: Vec<Option<String>>,
}

impl CompositeAuthorization {
    /// Create an empty composite
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field
    pub fn push(mut self, field: Option<impl Into<String>>) -> Self {
        self.fields.push(field.map(Into::into));
        self
    }

    /// Decode a token
    pub fn decode(token: &str) -> Self {
        Self {
            fields: decode(token),
        }
    }

    /// Encode into a token
    pub fn encode(&self) -> String {
        encode(self.fields.iter().map(Option::as_deref))
    }

    /// Field at `position`; positions past the end are absent
    pub fn get(&self, position: usize) -> Option<&str> {
        self.fields.get(position).and_then(Option::as_deref)
    }

    /// Raw segments, absent fields rendered as empty strings
    pub fn segments(&self) -> Vec<&str> {
        self.fields
            .iter()
            .map(|field| field.as_deref().unwrap_or_default())
            .collect()
    }

    /// Consume into exactly-addressable fields, padded to `expected`
    pub fn into_fields(mut self, expected: usize) -> Vec<Option<String>> {
        if self.fields.len() < expected {
            self.fields.resize(expected, None);
        }
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<S: Into<String>> FromIterator<Option<S>> for CompositeAuthorization {
    fn from_iter<T: IntoIterator<Item = Option<S>>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().map(|field| field.map(Into::into)).collect(),
        }
    }
}

impl fmt::Display for CompositeAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for CompositeAuthorization {
    type Err = Infallible;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Ok(Self::decode(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_fields_keep_their_position() {
        let token = encode([Some("txn_1"), None, Some("USD")]);
        assert_eq!(token, "txn_1||USD");

        let fields = decode(&token);
        assert_eq!(
            fields,
            vec![Some("txn_1".to_string()), None, Some("USD".to_string())]
        );
    }

    #[test]
    fn test_trailing_absent_field() {
        let token = encode([Some("a"), None::<&str>]);
        assert_eq!(token, "a|");
        assert_eq!(decode(&token), vec![Some("a".to_string()), None]);
    }

    #[test]
    fn test_decode_padded_short_token() {
        let fields = decode_padded("12345", 4);
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].as_deref(), Some("12345"));
        assert!(fields[1..].iter().all(Option::is_none));
    }

    #[test]
    fn test_empty_field_list_round_trips() {
        let token = encode(Vec::<Option<&str>>::new());
        assert_eq!(token, "");
        assert!(decode(&token).is_empty());
        assert!(CompositeAuthorization::decode("").is_empty());
        assert_eq!(decode_padded("", 3), vec![None, None, None]);
    }

    #[test]
    fn test_empty_string_decodes_as_absent() {
        let token = encode([Some("a"), Some(""), Some("c")]);
        assert_eq!(token, "a||c");
        assert_eq!(
            decode(&token),
            vec![Some("a".to_string()), None, Some("c".to_string())]
        );
    }

    #[test]
    fn test_decode_padded_keeps_extra_segments() {
        assert_eq!(decode_padded("a|b|c", 2).len(), 3);
    }

    #[test]
    fn test_delimiter_inside_field_shifts_positions() {
        let token = encode([Some("a|b"), Some("c")]);
        assert_eq!(decode(&token).len(), 3);
    }

    #[test]
    fn test_composite_accessors() {
        let composite = CompositeAuthorization::new()
            .push(Some("txn_9"))
            .push(None::<String>)
            .push(Some("EUR"));

        assert_eq!(composite.to_string(), "txn_9||EUR");
        assert_eq!(composite.get(0), Some("txn_9"));
        assert_eq!(composite.get(1), None);
        assert_eq!(composite.get(7), None);
        assert_eq!(composite.segments(), vec!["txn_9", "", "EUR"]);

        let parsed: CompositeAuthorization = "txn_9||EUR".parse().unwrap();
        assert_eq!(parsed, composite);
    }
}
