//! Core types for the gateway core

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Decoded payload of one remote reply, kept on every response for diagnostics
pub type Params = serde_json::Map<String, Value>;

/// Cross-provider error kinds a vendor error code can be mapped into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StandardErrorCode {
    CardDeclined,
    ExpiredCard,
    InvalidNumber,
    InvalidCvc,
    InvalidExpiryDate,
    IncorrectZip,
    IncorrectAddress,
    IncorrectPin,
    PickupCard,
    CallIssuer,
    ConfigError,
    UnsupportedFeature,
    ProcessingError,
}

impl StandardErrorCode {
    /// All members of the enumeration
    pub const ALL: [StandardErrorCode; 13] = [
        Self::CardDeclined,
        Self::ExpiredCard,
        Self::InvalidNumber,
        Self::InvalidCvc,
        Self::InvalidExpiryDate,
        Self::IncorrectZip,
        Self::IncorrectAddress,
        Self::IncorrectPin,
        Self::PickupCard,
        Self::CallIssuer,
        Self::ConfigError,
        Self::UnsupportedFeature,
        Self::ProcessingError,
    ];

    /// Get the snake_case identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CardDeclined => "card_declined",
            Self::ExpiredCard => "expired_card",
            Self::InvalidNumber => "invalid_number",
            Self::InvalidCvc => "invalid_cvc",
            Self::InvalidExpiryDate => "invalid_expiry_date",
            Self::IncorrectZip => "incorrect_zip",
            Self::IncorrectAddress => "incorrect_address",
            Self::IncorrectPin => "incorrect_pin",
            Self::PickupCard => "pickup_card",
            Self::CallIssuer => "call_issuer",
            Self::ConfigError => "config_error",
            Self::UnsupportedFeature => "unsupported_feature",
            Self::ProcessingError => "processing_error",
        }
    }
}

impl fmt::Display for StandardErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StandardErrorCode {
    type Err = crate::GatewayError;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| crate::GatewayError::unexpected(format!("Unknown error code: {s}")))
    }
}

/// Address verification result letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AvsCode {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    I,
    M,
    N,
    P,
    R,
    S,
    U,
    W,
    X,
    Y,
    Z,
}

impl AvsCode {
    /// Parse a vendor AVS code, using its first character
    pub fn from_code(code: &str) -> Option<Self> {
        let letter = code.trim().chars().next()?.to_ascii_uppercase();
        let avs = match letter {
            'A' => Self::A,
            'B' => Self::B,
            'C' => Self::C,
            'D' => Self::D,
            'E' => Self::E,
            'F' => Self::F,
            'G' => Self::G,
            'I' => Self::I,
            'M' => Self::M,
            'N' => Self::N,
            'P' => Self::P,
            'R' => Self::R,
            'S' => Self::S,
            'U' => Self::U,
            'W' => Self::W,
            'X' => Self::X,
            'Y' => Self::Y,
            'Z' => Self::Z,
            _ => return None,
        };
        Some(avs)
    }

    /// Human-readable description
    pub fn message(&self) -> &'static str {
        match self {
            Self::A => "Street address matches, but postal code does not match.",
            Self::B => "Street address matches, but postal code not verified.",
            Self::C => "Street address and postal code do not match.",
            Self::D => "Street address and postal code match.",
            Self::E => "AVS data is invalid or AVS is not allowed for this card type.",
            Self::F => "Card member's name does not match, but billing postal code matches.",
            Self::G => "Non-U.S. issuing bank does not support AVS.",
            Self::I => "Address not verified.",
            Self::M => "Street address and postal code match.",
            Self::N => "Street address and postal code do not match.",
            Self::P => "Postal code matches, but street address not verified.",
            Self::R => "System unavailable.",
            Self::S => "U.S.-issuing bank does not support AVS.",
            Self::U => "Address information unavailable.",
            Self::W => "Street address does not match, but 9-digit postal code matches.",
            Self::X => "Street address and 9-digit postal code match.",
            Self::Y => "Street address and 5-digit postal code match.",
            Self::Z => "Street address does not match, but 5-digit postal code matches.",
        }
    }

    /// Whether the street address matched, `None` when not verified
    pub fn street_match(&self) -> Option<bool> {
        match self {
            Self::A | Self::B | Self::D | Self::M | Self::X | Self::Y => Some(true),
            Self::C | Self::N | Self::W | Self::Z => Some(false),
            _ => None,
        }
    }

    /// Whether the postal code matched, `None` when not verified
    pub fn postal_match(&self) -> Option<bool> {
        match self {
            Self::D | Self::F | Self::M | Self::P | Self::W | Self::X | Self::Y | Self::Z => {
                Some(true)
            }
            Self::A | Self::C | Self::N => Some(false),
            _ => None,
        }
    }
}

/// Card verification value result letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CvvCode {
    D,
    I,
    M,
    N,
    P,
    S,
    U,
    X,
}

impl CvvCode {
    /// Parse a vendor CVV code, using its first character
    pub fn from_code(code: &str) -> Option<Self> {
        let letter = code.trim().chars().next()?.to_ascii_uppercase();
        let cvv = match letter {
            'D' => Self::D,
            'I' => Self::I,
            'M' => Self::M,
            'N' => Self::N,
            'P' => Self::P,
            'S' => Self::S,
            'U' => Self::U,
            'X' => Self::X,
            _ => return None,
        };
        Some(cvv)
    }

    /// Human-readable description
    pub fn message(&self) -> &'static str {
        match self {
            Self::D => "CVV check flagged transaction as suspicious",
            Self::I => "CVV failed data validation check",
            Self::M => "CVV matches",
            Self::N => "CVV does not match",
            Self::P => "CVV not processed",
            Self::S => "CVV should have been present",
            Self::U => "CVV request unable to be processed by issuer",
            Self::X => "Issuer does not participate in CVV2 service",
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Self::M)
    }
}

/// Canonical outcome of one remote operation
///
/// Immutable once built: the `with_*` methods consume the value. An error
/// code can only ever be attached to a failed response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayResponse {
    success: bool,
    message: String,
    params: Params,
    #[serde(skip_serializing_if = "Option::is_none")]
    authorization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avs_result: Option<AvsCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cvv_result: Option<CvvCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<StandardErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vendor_error_code: Option<String>,
    test: bool,
}

impl GatewayResponse {
    /// Create a new response
    pub fn new(success: bool, message: impl Into<String>, params: Params) -> Self {
        Self {
            success,
            message: message.into(),
            params,
            authorization: None,
            avs_result: None,
            cvv_result: None,
            error_code: None,
            vendor_error_code: None,
            test: false,
        }
    }

    /// Set the authorization token
    pub fn with_authorization(mut self, authorization: Option<String>) -> Self {
        self.authorization = authorization;
        self
    }

    /// Set the AVS result
    pub fn with_avs_result(mut self, avs: Option<AvsCode>) -> Self {
        self.avs_result = avs;
        self
    }

    /// Set the CVV result
    pub fn with_cvv_result(mut self, cvv: Option<CvvCode>) -> Self {
        self.cvv_result = cvv;
        self
    }

    /// Set the standard error code; ignored on a successful response
    pub fn with_error_code(mut self, code: Option<StandardErrorCode>) -> Self {
        if !self.success {
            self.error_code = code;
        }
        self
    }

    /// Set the raw vendor error code; ignored on a successful response
    pub fn with_vendor_error_code(mut self, code: Option<String>) -> Self {
        if !self.success {
            self.vendor_error_code = code;
        }
        self
    }

    /// Mark the response as produced in test mode
    pub fn with_test(mut self, test: bool) -> Self {
        self.test = test;
        self
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    pub fn avs_result(&self) -> Option<AvsCode> {
        self.avs_result
    }

    pub fn cvv_result(&self) -> Option<CvvCode> {
        self.cvv_result
    }

    pub fn error_code(&self) -> Option<StandardErrorCode> {
        self.error_code
    }

    pub fn vendor_error_code(&self) -> Option<&str> {
        self.vendor_error_code.as_deref()
    }

    pub fn is_test(&self) -> bool {
        self.test
    }
}
