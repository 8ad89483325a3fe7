//! Turning decoded replies into [`GatewayResponse`] values
//!
//! Adapters supply the vendor-specific pieces through [`ResponseExtractors`];
//! [`ResponseNormalizer`] applies them in a fixed order and also absorbs
//! unparsable bodies and non-2xx replies, so none of those reach a run as an
//! error.

use crate::error_code::{ErrorCodeMapper, VendorCode};
use crate::payload::PayloadFormat;
use crate::types::{AvsCode, CvvCode, GatewayResponse, Params, StandardErrorCode};
use serde_json::Value;
use tracing::{debug, warn};

/// Sentinel key holding an unparsable body in [`GatewayResponse::params`]
pub const RAW_RESPONSE_KEY: &str = "raw_response";

/// Key holding the HTTP status of an unparsable reply
pub const HTTP_STATUS_KEY: &str = "http_status";

/// Vendor-specific field extraction, implemented by each adapter
pub trait ResponseExtractors {
    fn success_from(&self, params: &Params) -> bool;

    fn message_from(&self, params: &Params) -> String;

    fn authorization_from(&self, params: &Params) -> Option<String>;

    /// Raw vendor error code; only consulted for failed replies
    fn error_code_from(&self, params: &Params) -> Option<VendorCode>;

    fn avs_from(&self, _params: &Params) -> Option<AvsCode> {
        None
    }

    fn cvv_from(&self, _params: &Params) -> Option<CvvCode> {
        None
    }
}

/// Builds [`GatewayResponse`] values for one adapter
pub struct ResponseNormalizer<'a, E: ?Sized> {
    extractors: &'a E,
    format: PayloadFormat,
    error_codes: &'a ErrorCodeMapper,
    default_error_code: Option<StandardErrorCode>,
    test: bool,
    gateway_name: &'a str,
}

impl<'a, E: ResponseExtractors + ?Sized> ResponseNormalizer<'a, E> {
    /// Create a normalizer over an adapter's extractors and error table
    pub fn new(
        extractors: &'a E,
        format: PayloadFormat,
        error_codes: &'a ErrorCodeMapper,
    ) -> Self {
        Self {
            extractors,
            format,
            error_codes,
            default_error_code: None,
            test: false,
            gateway_name: "gateway",
        }
    }

    /// Error code to use when the vendor code has no table entry
    pub fn default_error_code(mut self, code: StandardErrorCode) -> Self {
        self.default_error_code = Some(code);
        self
    }

    /// Mark produced responses as test-mode
    pub fn test_mode(mut self, test: bool) -> Self {
        self.test = test;
        self
    }

    /// Name used in diagnostic messages
    pub fn gateway_name(mut self, name: &'a str) -> Self {
        self.gateway_name = name;
        self
    }

    pub fn format(&self) -> &PayloadFormat {
        &self.format
    }

    /// Build a response from a decoded payload
    pub fn normalize(&self, params: Params) -> GatewayResponse {
        let success = self.extractors.success_from(&params);
        let message = self.extractors.message_from(&params);
        let authorization = self.extractors.authorization_from(&params);
        let avs = self.extractors.avs_from(&params);
        let cvv = self.extractors.cvv_from(&params);

        let (error_code, vendor_code) = if success {
            (None, None)
        } else {
            let vendor_code = self.extractors.error_code_from(&params);
            let standard = vendor_code
                .as_ref()
                .and_then(|code| self.error_codes.map(code))
                .or(self.default_error_code)
                .or(self.error_codes.fallback());
            (standard, vendor_code.map(|code| code.to_string()))
        };

        GatewayResponse::new(success, message, params)
            .with_authorization(authorization)
            .with_avs_result(avs)
            .with_cvv_result(cvv)
            .with_error_code(error_code)
            .with_vendor_error_code(vendor_code)
            .with_test(self.test)
    }

    /// Decode a body and build a response; unparsable bodies become failures
    pub fn normalize_body(&self, body: &str) -> GatewayResponse {
        match self.format.parse(body) {
            Ok(params) => self.normalize(params),
            Err(err) => {
                warn!(
                    gateway = self.gateway_name,
                    format = self.format.name(),
                    error = %err,
                    "unparsable response body"
                );
                self.unparsable_response(None, body)
            }
        }
    }

    /// Build a response from any HTTP reply
    pub fn normalize_http(&self, status: u16, body: &str) -> GatewayResponse {
        if (200..300).contains(&status) {
            self.normalize_body(body)
        } else {
            self.normalize_transport_failure(status, body)
        }
    }

    /// Build a response from a transport reply
    pub fn normalize_raw(&self, raw: &crate::transport::RawResponse) -> GatewayResponse {
        self.normalize_http(raw.status.as_u16(), &raw.body)
    }

    /// Build a response from a non-2xx reply
    ///
    /// A body in the expected format goes through [`normalize`](Self::normalize)
    /// like any other reply; anything else becomes a synthetic failure that
    /// carries the body verbatim.
    pub fn normalize_transport_failure(&self, status: u16, body: &str) -> GatewayResponse {
        match self.format.parse(body) {
            Ok(params) => {
                debug!(gateway = self.gateway_name, status, "normalizing error reply");
                self.normalize(params)
            }
            Err(err) => {
                warn!(
                    gateway = self.gateway_name,
                    status,
                    error = %err,
                    "unparsable error reply"
                );
                self.unparsable_response(Some(status), body)
            }
        }
    }

    /// Synthetic failure for a body that could not be decoded
    pub fn unparsable_response(&self, status: Option<u16>, body: &str) -> GatewayResponse {
        let message = format!(
            "Invalid response received from the {name} API. Please contact {name} if you \
             continue to receive this message. (The raw response returned by the API was \"{body}\")",
            name = self.gateway_name,
        );

        let mut params = Params::new();
        params.insert(RAW_RESPONSE_KEY.to_string(), Value::String(body.to_string()));
        if let Some(status) = status {
            params.insert(HTTP_STATUS_KEY.to_string(), Value::from(status));
        }

        GatewayResponse::new(false, message, params).with_test(self.test)
    }
}
