#![allow(dead_code)]

use gateway_core::authorization;
use gateway_core::gateway::{Action, Gateway, PaymentSource, TransactionOptions};
use gateway_core::transport::HttpTransport;
use gateway_core::{
    ErrorCodeMapper, GatewayConfig, GatewayResponse, MultiResponse, Params, PayloadFormat,
    ResponseExtractors, ResponseNormalizer, Result, RunPolicy, RunResult, StandardErrorCode,
    VendorCode,
};
use serde_json::{json, Value};

pub const ACCESS_TOKEN_KEY: &str = "access_token";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn acme_config(url: &str) -> GatewayConfig {
    GatewayConfig::builder("Acme")
        .test_mode(true)
        .test_url(url)
        .live_url(url)
        .credential("client_id", "cid_123")
        .credential("client_secret", "secret_456")
        .build()
        .unwrap()
}

/// JSON adapter that obtains a bearer token before every charge
pub struct AcmeGateway {
    config: GatewayConfig,
    transport: HttpTransport,
    error_codes: ErrorCodeMapper,
}

impl AcmeGateway {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        config.require(&["client_id", "client_secret"])?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self {
            config,
            transport,
            error_codes: ErrorCodeMapper::from_pairs([
                ("card_declined", StandardErrorCode::CardDeclined),
                ("expired_card", StandardErrorCode::ExpiredCard),
                ("invalid_client", StandardErrorCode::ConfigError),
            ]),
        })
    }

    fn normalizer(&self) -> ResponseNormalizer<'_, Self> {
        ResponseNormalizer::new(self, PayloadFormat::Json, &self.error_codes)
            .test_mode(self.config.is_test())
            .gateway_name(self.config.display_name())
    }

    fn fetch_token(&self) -> Result<GatewayResponse> {
        let url = self.config.endpoint_for("oauth/token")?;
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.credential("client_id").unwrap_or_default()),
            ("client_secret", self.config.credential("client_secret").unwrap_or_default()),
        ];
        let raw = self.transport.post_form(url.as_str(), &form, &[])?;
        Ok(self.normalizer().normalize_raw(&raw))
    }

    fn charge(
        &self,
        bearer: &str,
        amount: u64,
        source: &PaymentSource,
        options: &TransactionOptions,
    ) -> Result<GatewayResponse> {
        let url = self.config.endpoint_for("v1/charges")?;
        let body = json!({
            "amount": amount,
            "currency": options.currency.as_deref().unwrap_or("usd"),
            "source": source.identifier(),
        });
        let authorization = format!("Bearer {bearer}");
        let raw = self
            .transport
            .post_json(url.as_str(), &body, &[("authorization", authorization.as_str())])?;
        Ok(self.normalizer().normalize_raw(&raw))
    }

    /// Token then charge, as one run
    pub fn purchase_run(
        &self,
        amount: u64,
        source: &PaymentSource,
        options: &TransactionOptions,
    ) -> Result<RunResult> {
        MultiResponse::run(RunPolicy::UseLastResponse)
            .process(false, |ctx| {
                let response = self.fetch_token()?;
                if let Some(token) = response.authorization() {
                    ctx.set_session_value(ACCESS_TOKEN_KEY, token);
                }
                Ok(response)
            })
            .process(false, |ctx| {
                let bearer = ctx.session_value(ACCESS_TOKEN_KEY).unwrap_or_default();
                self.charge(bearer, amount, source, options)
            })
            .execute()
    }
}

fn text<'p>(params: &'p Params, key: &str) -> Option<&'p str> {
    params.get(key).and_then(Value::as_str)
}

impl ResponseExtractors for AcmeGateway {
    fn success_from(&self, params: &Params) -> bool {
        params.get("error").is_none()
            && (text(params, "status") == Some("succeeded") || params.contains_key(ACCESS_TOKEN_KEY))
    }

    fn message_from(&self, params: &Params) -> String {
        text(params, "message")
            .or_else(|| text(params, "status"))
            .unwrap_or("Token issued")
            .to_string()
    }

    fn authorization_from(&self, params: &Params) -> Option<String> {
        if let Some(token) = text(params, ACCESS_TOKEN_KEY) {
            return Some(token.to_string());
        }
        let id = text(params, "id")?;
        Some(authorization::encode([Some(id), text(params, "currency")]))
    }

    fn error_code_from(&self, params: &Params) -> Option<VendorCode> {
        text(params, "error").map(VendorCode::from)
    }
}

impl Gateway for AcmeGateway {
    fn name(&self) -> &str {
        self.config.display_name()
    }

    fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn supported_actions(&self) -> &[Action] {
        &[Action::Purchase]
    }

    fn purchase(
        &self,
        amount: u64,
        source: &PaymentSource,
        options: &TransactionOptions,
    ) -> Result<GatewayResponse> {
        Ok(self.purchase_run(amount, source, options)?.into_primary())
    }
}
