//! The adapter interface
//!
//! A concrete adapter maps domain data to one vendor's wire format and back.
//! It implements the subset of [`Gateway`] capabilities its vendor offers; the
//! rest keep their default, which reports [`GatewayError::NotSupported`].

use crate::config::GatewayConfig;
use crate::multi_response::{MultiResponse, RunPolicy, RunResult};
use crate::types::GatewayResponse;
use crate::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount authorized by the default [`Gateway::verify`], in minor units
pub const VERIFY_AMOUNT: u64 = 100;

/// Capability of an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Purchase,
    Authorize,
    Capture,
    Refund,
    Void,
    Store,
    Verify,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Authorize => "authorize",
            Self::Capture => "capture",
            Self::Refund => "refund",
            Self::Void => "void",
            Self::Store => "store",
            Self::Verify => "verify",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Card data handed to an adapter
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCard {
    pub number: String,
    pub month: u8,
    pub year: u16,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_value: Option<String>,
}

impl CreditCard {
    /// Create a card without a verification value
    pub fn new(
        number: impl Into<String>,
        month: u8,
        year: u16,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            month,
            year,
            first_name: first_name.into(),
            last_name: last_name.into(),
            verification_value: None,
        }
    }

    /// Set the verification value
    pub fn with_verification_value(mut self, value: impl Into<String>) -> Self {
        self.verification_value = Some(value.into());
        self
    }

    /// Number with all but the last four digits masked
    pub fn masked_number(&self) -> String {
        let digits = self.number.chars().count();
        let visible = digits.saturating_sub(4);
        self.number
            .chars()
            .enumerate()
            .map(|(index, c)| if index < visible { 'X' } else { c })
            .collect()
    }

    pub fn last_digits(&self) -> &str {
        let start = self.number.len().saturating_sub(4);
        self.number.get(start..).unwrap_or_default()
    }
}

impl fmt::Debug for CreditCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreditCard")
            .field("number", &self.masked_number())
            .field("month", &self.month)
            .field("year", &self.year)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field(
                "verification_value",
                &self.verification_value.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// What a payment is charged against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentSource {
    Card(CreditCard),
    /// Vendor-side stored payment method
    Token(String),
}

impl PaymentSource {
    /// The card number or the token, whichever identifies this source
    pub fn identifier(&self) -> &str {
        match self {
            Self::Card(card) => &card.number,
            Self::Token(token) => token,
        }
    }
}

impl From<CreditCard> for PaymentSource {
    fn from(card: CreditCard) -> Self {
        Self::Card(card)
    }
}

/// Postal address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
}

/// Per-transaction options forwarded to the adapter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOptions {
    pub order_id: Option<String>,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub email: Option<String>,
    pub billing_address: Option<Address>,
}

impl TransactionOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the order id
    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    /// Set the currency
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the billing address
    pub fn with_billing_address(mut self, address: Address) -> Self {
        self.billing_address = Some(address);
        self
    }
}

/// Capability set every adapter exposes
///
/// Each call performs at most one blocking vendor round trip. Declines and
/// validation failures come back as `Ok` with a failed response; `Err` means
/// no usable reply was obtained.
pub trait Gateway {
    /// Display name of the vendor
    fn name(&self) -> &str;

    fn config(&self) -> &GatewayConfig;

    /// Capabilities this adapter implements
    fn supported_actions(&self) -> &[Action];

    fn supports(&self, action: Action) -> bool {
        self.supported_actions().contains(&action)
    }

    fn purchase(
        &self,
        _amount: u64,
        _source: &PaymentSource,
        _options: &TransactionOptions,
    ) -> Result<GatewayResponse> {
        Err(GatewayError::not_supported(self.name(), Action::Purchase))
    }

    fn authorize(
        &self,
        _amount: u64,
        _source: &PaymentSource,
        _options: &TransactionOptions,
    ) -> Result<GatewayResponse> {
        Err(GatewayError::not_supported(self.name(), Action::Authorize))
    }

    fn capture(
        &self,
        _amount: u64,
        _authorization: &str,
        _options: &TransactionOptions,
    ) -> Result<GatewayResponse> {
        Err(GatewayError::not_supported(self.name(), Action::Capture))
    }

    fn refund(
        &self,
        _amount: u64,
        _authorization: &str,
        _options: &TransactionOptions,
    ) -> Result<GatewayResponse> {
        Err(GatewayError::not_supported(self.name(), Action::Refund))
    }

    fn void(&self, _authorization: &str, _options: &TransactionOptions) -> Result<GatewayResponse> {
        Err(GatewayError::not_supported(self.name(), Action::Void))
    }

    fn store(&self, _source: &PaymentSource, _options: &TransactionOptions) -> Result<GatewayResponse> {
        Err(GatewayError::not_supported(self.name(), Action::Store))
    }

    /// Authorize a small amount and release it again
    ///
    /// The void is best-effort: its failure does not mask the authorization
    /// result, which stays primary. Adapters that cannot void are refused
    /// before any hold is placed.
    fn verify(&self, source: &PaymentSource, options: &TransactionOptions) -> Result<RunResult> {
        if !self.supports(Action::Authorize) || !self.supports(Action::Void) {
            return Err(GatewayError::not_supported(self.name(), Action::Verify));
        }
        MultiResponse::run(RunPolicy::UseFirstResponse)
            .process(false, |_| self.authorize(VERIFY_AMOUNT, source, options))
            .process(true, |ctx| {
                let authorization = ctx.authorization().unwrap_or_default().to_string();
                self.void(&authorization, options)
            })
            .execute()
    }
}
