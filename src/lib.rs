//! # gateway-core - payment gateway orchestration
//!
//! The shared core every payment gateway adapter relies on: sequential
//! multi-step runs with short-circuit and ignore-failure policies, response
//! normalization from decoded vendor payloads, composite authorization tokens,
//! and vendor error code mapping.

pub mod authorization;
pub mod config;
pub mod error;
pub mod error_code;
pub mod gateway;
pub mod gateways;
pub mod multi_response;
pub mod normalizer;
pub mod payload;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use authorization::CompositeAuthorization;
pub use config::{GatewayConfig, GatewayConfigBuilder};
pub use error::{GatewayError, Result};
pub use error_code::{ErrorCodeMapper, VendorCode};
pub use gateway::{Action, Gateway, PaymentSource, TransactionOptions};
pub use multi_response::{
    MultiResponse, RunBuilder, RunContext, RunPolicy, RunResult, RunStart, Step,
};
pub use normalizer::{ResponseExtractors, ResponseNormalizer};
pub use payload::PayloadFormat;
pub use types::*;

/// Current version of the gateway-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_verify_through_bogus_gateway() {
        let config = GatewayConfig::builder("Bogus").test_mode(true).build().unwrap();
        let gateway = gateways::BogusGateway::new(config);
        let source = PaymentSource::Token("tok_0001".to_string());

        let run = gateway.verify(&source, &TransactionOptions::new()).unwrap();

        assert!(run.success());
        assert_eq!(run.all().len(), 2);
        assert_eq!(run.policy(), RunPolicy::UseFirstResponse);
        assert_eq!(run.primary().authorization(), Some("53433|100|"));
    }

    #[test]
    fn test_capture_after_authorize_round_trips_token() {
        let config = GatewayConfig::builder("Bogus").build().unwrap();
        let gateway = gateways::BogusGateway::new(config);
        let options = TransactionOptions::new().with_currency("EUR");
        let source = PaymentSource::Token("tok_0001".to_string());

        let run = MultiResponse::run(RunPolicy::UseLastResponse)
            .process(false, |_| gateway.authorize(2500, &source, &options))
            .process(false, |ctx| {
                let authorization = ctx.authorization().unwrap_or_default().to_string();
                gateway.capture(2500, &authorization, &options)
            })
            .execute()
            .unwrap();

        assert!(run.success());
        let token = CompositeAuthorization::decode(run.authorization().unwrap());
        assert_eq!(token.get(0), Some("53433"));
        assert_eq!(token.get(1), Some("2500"));
        assert_eq!(token.get(2), Some("EUR"));
    }
}
