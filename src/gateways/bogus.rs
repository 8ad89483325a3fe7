//! In-process gateway for integration tests
//!
//! Outcomes are forced by the input instead of a vendor:
//!
//! - purchase, authorize and store look at the last character of the card
//!   number or token: `1` approves, `2` declines, anything else is an error;
//! - capture, refund and void decode the composite authorization
//!   `[transaction_id, amount, currency]` and look at the last character of
//!   the transaction id: `1` is an error, `2` declines, anything else approves.

use crate::authorization::{self, CompositeAuthorization};
use crate::config::GatewayConfig;
use crate::error_code::{ErrorCodeMapper, VendorCode};
use crate::gateway::{Action, Gateway, PaymentSource, TransactionOptions};
use crate::normalizer::{ResponseExtractors, ResponseNormalizer};
use crate::payload::PayloadFormat;
use crate::types::{AvsCode, CvvCode, GatewayResponse, Params};
use crate::{GatewayError, Result};
use serde_json::{json, Value};

pub const TRANSACTION_ID: &str = "53433";
pub const SUCCESS_MESSAGE: &str = "Bogus Gateway: Forced success";
pub const FAILURE_MESSAGE: &str = "Bogus Gateway: Forced failure";
pub const NUMBER_ERROR_MESSAGE: &str =
    "Bogus Gateway: Use a number ending in 1 for success, 2 for failure and anything else for error";
pub const REFERENCE_ERROR_MESSAGE: &str =
    "Bogus Gateway: Use a transaction id ending in 1 for error, 2 for failure and anything else for success";

/// Vendor code attached to every forced decline
const DECLINE_CODE: &str = "05";

const AUTHORIZATION_FIELDS: usize = 3;

const SUPPORTED: [Action; 7] = [
    Action::Purchase,
    Action::Authorize,
    Action::Capture,
    Action::Refund,
    Action::Void,
    Action::Store,
    Action::Verify,
];

enum Outcome {
    Approve,
    Decline,
    Fail,
}

/// Gateway whose outcomes are forced by its input
#[derive(Debug, Clone)]
pub struct BogusGateway {
    config: GatewayConfig,
    error_codes: ErrorCodeMapper,
}

impl BogusGateway {
    /// Create a bogus gateway
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            error_codes: ErrorCodeMapper::iso8583(),
        }
    }

    fn normalizer(&self) -> ResponseNormalizer<'_, Self> {
        ResponseNormalizer::new(self, PayloadFormat::Json, &self.error_codes)
            .test_mode(self.config.is_test())
            .gateway_name(self.config.display_name())
    }

    fn source_outcome(source: &PaymentSource) -> Outcome {
        match source.identifier().chars().last() {
            Some('1') => Outcome::Approve,
            Some('2') => Outcome::Decline,
            _ => Outcome::Fail,
        }
    }

    fn reference_outcome(reference: &str) -> (Outcome, CompositeAuthorization) {
        let fields: CompositeAuthorization =
            authorization::decode_padded(reference, AUTHORIZATION_FIELDS)
                .into_iter()
                .collect();
        let outcome = match fields.get(0).and_then(|id| id.chars().last()) {
            Some('1') => Outcome::Fail,
            Some('2') => Outcome::Decline,
            _ => Outcome::Approve,
        };
        (outcome, fields)
    }

    fn reply(&self, approved: bool, mut params: Params) -> GatewayResponse {
        params.insert(
            "status".to_string(),
            Value::from(if approved { "approved" } else { "declined" }),
        );
        params.insert(
            "message".to_string(),
            Value::from(if approved { SUCCESS_MESSAGE } else { FAILURE_MESSAGE }),
        );
        if !approved {
            params.insert("response_code".to_string(), Value::from(DECLINE_CODE));
        }
        self.normalizer().normalize(params)
    }

    fn charge(
        &self,
        action: Action,
        amount: u64,
        source: &PaymentSource,
        options: &TransactionOptions,
    ) -> Result<GatewayResponse> {
        let currency = options.currency.as_deref();
        let params = into_params(json!({
            "action": action.as_str(),
            "amount": amount,
            "currency": currency,
            "avs_code": "Y",
            "cvv_code": "M",
        }));

        match Self::source_outcome(source) {
            Outcome::Approve => {
                let token = authorization::encode([
                    Some(TRANSACTION_ID.to_string()),
                    Some(amount.to_string()),
                    currency.map(str::to_string),
                ]);
                Ok(self.reply(true, with_authorization(params, token)))
            }
            Outcome::Decline => Ok(self.reply(false, params)),
            Outcome::Fail => Err(GatewayError::unexpected(NUMBER_ERROR_MESSAGE)),
        }
    }

    fn follow_up(&self, action: Action, amount: Option<u64>, reference: &str) -> Result<GatewayResponse> {
        let (outcome, fields) = Self::reference_outcome(reference);
        let params = into_params(json!({
            "action": action.as_str(),
            "amount": amount.map(Value::from).or_else(|| fields.get(1).map(Value::from)),
            "currency": fields.get(2),
            "transaction_id": fields.get(0),
        }));

        match outcome {
            Outcome::Approve => Ok(self.reply(true, with_authorization(params, reference.to_string()))),
            Outcome::Decline => Ok(self.reply(false, params)),
            Outcome::Fail => Err(GatewayError::unexpected(REFERENCE_ERROR_MESSAGE)),
        }
    }
}

fn into_params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

fn with_authorization(mut params: Params, authorization: String) -> Params {
    params.insert("authorization".to_string(), Value::String(authorization));
    params
}

fn string_field<'p>(params: &'p Params, key: &str) -> Option<&'p str> {
    params.get(key).and_then(Value::as_str)
}

impl ResponseExtractors for BogusGateway {
    fn success_from(&self, params: &Params) -> bool {
        string_field(params, "status") == Some("approved")
    }

    fn message_from(&self, params: &Params) -> String {
        string_field(params, "message").unwrap_or_default().to_string()
    }

    fn authorization_from(&self, params: &Params) -> Option<String> {
        string_field(params, "authorization").map(str::to_string)
    }

    fn error_code_from(&self, params: &Params) -> Option<VendorCode> {
        string_field(params, "response_code").map(VendorCode::from)
    }

    fn avs_from(&self, params: &Params) -> Option<AvsCode> {
        string_field(params, "avs_code").and_then(AvsCode::from_code)
    }

    fn cvv_from(&self, params: &Params) -> Option<CvvCode> {
        string_field(params, "cvv_code").and_then(CvvCode::from_code)
    }
}

impl Gateway for BogusGateway {
    fn name(&self) -> &str {
        self.config.display_name()
    }

    fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn supported_actions(&self) -> &[Action] {
        &SUPPORTED
    }

    fn purchase(
        &self,
        amount: u64,
        source: &PaymentSource,
        options: &TransactionOptions,
    ) -> Result<GatewayResponse> {
        self.charge(Action::Purchase, amount, source, options)
    }

    fn authorize(
        &self,
        amount: u64,
        source: &PaymentSource,
        options: &TransactionOptions,
    ) -> Result<GatewayResponse> {
        self.charge(Action::Authorize, amount, source, options)
    }

    fn capture(
        &self,
        amount: u64,
        authorization: &str,
        _options: &TransactionOptions,
    ) -> Result<GatewayResponse> {
        self.follow_up(Action::Capture, Some(amount), authorization)
    }

    fn refund(
        &self,
        amount: u64,
        authorization: &str,
        _options: &TransactionOptions,
    ) -> Result<GatewayResponse> {
        self.follow_up(Action::Refund, Some(amount), authorization)
    }

    fn void(&self, authorization: &str, _options: &TransactionOptions) -> Result<GatewayResponse> {
        self.follow_up(Action::Void, None, authorization)
    }

    fn store(&self, source: &PaymentSource, _options: &TransactionOptions) -> Result<GatewayResponse> {
        let params = into_params(json!({ "action": Action::Store.as_str() }));

        match Self::source_outcome(source) {
            Outcome::Approve => {
                let identifier = source.identifier();
                let last4 = identifier
                    .get(identifier.len().saturating_sub(4)..)
                    .unwrap_or(identifier);
                let token = authorization::encode([Some(format!("tok_{last4}")), None, None]);
                Ok(self.reply(true, with_authorization(params, token)))
            }
            Outcome::Decline => Ok(self.reply(false, params)),
            Outcome::Fail => Err(GatewayError::unexpected(NUMBER_ERROR_MESSAGE)),
        }
    }
}
