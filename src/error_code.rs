//! Vendor error code translation
//!
//! Each adapter owns an [`ErrorCodeMapper`] table from its own response codes
//! to a [`StandardErrorCode`]. A code missing from the table maps to nothing
//! so the caller can decide whether to surface the raw vendor code instead.
//!
//! Numeric codes are keyed by their decimal rendering, so `Numeric(5)` matches
//! a `"5"` entry but not `"05"`. Tables keyed by fixed-width codes opt into
//! zero padding with [`ErrorCodeMapper::pad_numeric`].

use crate::types::StandardErrorCode;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// Error code as reported by a vendor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VendorCode {
    Text(String),
    Numeric(i64),
}

impl VendorCode {
    /// Lookup key: trimmed text, or the decimal rendering of a number
    pub fn key(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text.trim()),
            Self::Numeric(number) => Cow::Owned(number.to_string()),
        }
    }
}

impl fmt::Display for VendorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Numeric(number) => write!(f, "{number}"),
        }
    }
}

impl From<&str> for VendorCode {
    fn from(code: &str) -> Self {
        Self::Text(code.to_string())
    }
}

impl From<String> for VendorCode {
    fn from(code: String) -> Self {
        Self::Text(code)
    }
}

impl From<i64> for VendorCode {
    fn from(code: i64) -> Self {
        Self::Numeric(code)
    }
}

impl From<i32> for VendorCode {
    fn from(code: i32) -> Self {
        Self::Numeric(i64::from(code))
    }
}

impl From<u32> for VendorCode {
    fn from(code: u32) -> Self {
        Self::Numeric(i64::from(code))
    }
}

/// Per-adapter lookup table from vendor codes to standard error kinds
#[derive(Debug, Clone, Default)]
pub struct ErrorCodeMapper {
    table: HashMap<String, StandardErrorCode>,
    fallback: Option<StandardErrorCode>,
    numeric_width: usize,
}

impl ErrorCodeMapper {
    /// Create an empty mapper
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mapper from `(vendor code, standard code)` pairs
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, StandardErrorCode)>,
        K: Into<VendorCode>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |mapper, (code, standard)| mapper.with(code, standard))
    }

    /// Add one entry
    pub fn with(mut self, code: impl Into<VendorCode>, standard: StandardErrorCode) -> Self {
        let code = code.into();
        self.table.insert(code.key().into_owned(), standard);
        self
    }

    /// Opt into a default for codes the table has no entry for
    pub fn with_fallback(mut self, standard: StandardErrorCode) -> Self {
        self.fallback = Some(standard);
        self
    }

    /// Zero-pad numeric vendor codes to `width` digits before lookup
    pub fn pad_numeric(mut self, width: usize) -> Self {
        self.numeric_width = width;
        self
    }

    fn lookup_key<'c>(&self, code: &'c VendorCode) -> Cow<'c, str> {
        match code {
            VendorCode::Numeric(number) if *number >= 0 && self.numeric_width > 0 => {
                Cow::Owned(format!("{number:0width$}", width = self.numeric_width))
            }
            _ => code.key(),
        }
    }

    /// Pure table lookup; never applies the fallback
    pub fn map(&self, code: &VendorCode) -> Option<StandardErrorCode> {
        self.table.get(self.lookup_key(code).as_ref()).copied()
    }

    /// Table lookup, then the opted-in fallback when there is no entry
    pub fn map_or_fallback(&self, code: Option<&VendorCode>) -> Option<StandardErrorCode> {
        code.and_then(|code| self.map(code)).or(self.fallback)
    }

    pub fn fallback(&self) -> Option<StandardErrorCode> {
        self.fallback
    }

    pub fn contains(&self, code: &VendorCode) -> bool {
        self.table.contains_key(self.lookup_key(code).as_ref())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Common ISO 8583 response codes used by acquirer-facing gateways
    pub fn iso8583() -> Self {
        use StandardErrorCode::*;

        Self::from_pairs([
            ("01", CallIssuer),
            ("02", CallIssuer),
            ("04", PickupCard),
            ("05", CardDeclined),
            ("07", PickupCard),
            ("12", CardDeclined),
            ("14", InvalidNumber),
            ("15", InvalidNumber),
            ("33", ExpiredCard),
            ("41", PickupCard),
            ("43", PickupCard),
            ("51", CardDeclined),
            ("54", ExpiredCard),
            ("55", IncorrectPin),
            ("57", CardDeclined),
            ("61", CardDeclined),
            ("62", CardDeclined),
            ("65", CardDeclined),
            ("75", IncorrectPin),
            ("82", InvalidCvc),
            ("N7", InvalidCvc),
            ("91", ProcessingError),
            ("96", ProcessingError),
        ])
        .pad_numeric(2)
    }
}
