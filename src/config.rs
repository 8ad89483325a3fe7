//! Immutable adapter configuration
//!
//! Every adapter receives its credentials and mode through a [`GatewayConfig`]
//! at construction time; nothing is read from process-wide state.

use crate::{GatewayError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for one adapter instance
#[derive(Clone)]
pub struct GatewayConfig {
    display_name: String,
    test_mode: bool,
    live_url: Option<Url>,
    test_url: Option<Url>,
    timeout: Duration,
    credentials: BTreeMap<String, String>,
}

impl GatewayConfig {
    /// Start building a configuration
    pub fn builder(display_name: impl Into<String>) -> GatewayConfigBuilder {
        GatewayConfigBuilder::new(display_name)
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_test(&self) -> bool {
        self.test_mode
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Endpoint for the current mode
    pub fn endpoint(&self) -> Option<&Url> {
        if self.test_mode {
            self.test_url.as_ref()
        } else {
            self.live_url.as_ref()
        }
    }

    /// Endpoint for the current mode joined with `path`
    pub fn endpoint_for(&self, path: &str) -> Result<Url> {
        let base = self.endpoint().ok_or_else(|| {
            GatewayError::config(format!(
                "{} has no {} endpoint configured",
                self.display_name,
                if self.test_mode { "test" } else { "live" }
            ))
        })?;
        Ok(base.join(path)?)
    }

    pub fn credential(&self, key: &str) -> Option<&str> {
        self.credentials.get(key).map(String::as_str)
    }

    /// Fail unless every key has a non-empty credential
    pub fn require(&self, keys: &[&str]) -> Result<()> {
        let missing: Vec<&str> = keys
            .iter()
            .copied()
            .filter(|key| self.credential(key).map_or(true, str::is_empty))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::config(format!(
                "{} is missing required credentials: {}",
                self.display_name,
                missing.join(", ")
            )))
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let credentials: Vec<&str> = self.credentials.keys().map(String::as_str).collect();
        f.debug_struct("GatewayConfig")
            .field("display_name", &self.display_name)
            .field("test_mode", &self.test_mode)
            .field("live_url", &self.live_url.as_ref().map(Url::as_str))
            .field("test_url", &self.test_url.as_ref().map(Url::as_str))
            .field("timeout", &self.timeout)
            .field("credentials", &credentials)
            .finish()
    }
}

/// Builder for [`GatewayConfig`]
#[derive(Debug, Clone)]
pub struct GatewayConfigBuilder {
    display_name: String,
    test_mode: bool,
    live_url: Option<String>,
    test_url: Option<String>,
    timeout: Duration,
    credentials: BTreeMap<String, String>,
}

impl GatewayConfigBuilder {
    /// Create a new builder
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            test_mode: false,
            live_url: None,
            test_url: None,
            timeout: DEFAULT_TIMEOUT,
            credentials: BTreeMap::new(),
        }
    }

    /// Route calls to the test endpoint
    pub fn test_mode(mut self, test: bool) -> Self {
        self.test_mode = test;
        self
    }

    /// Set the live endpoint
    pub fn live_url(mut self, url: impl Into<String>) -> Self {
        self.live_url = Some(url.into());
        self
    }

    /// Set the test endpoint
    pub fn test_url(mut self, url: impl Into<String>) -> Self {
        self.test_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a credential
    pub fn credential(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.credentials.insert(key.into(), value.into());
        self
    }

    /// Build the configuration, validating endpoint URLs
    pub fn build(self) -> Result<GatewayConfig> {
        if self.timeout.is_zero() {
            return Err(GatewayError::config("timeout must be greater than zero"));
        }

        Ok(GatewayConfig {
            display_name: self.display_name,
            test_mode: self.test_mode,
            live_url: self.live_url.as_deref().map(Url::parse).transpose()?,
            test_url: self.test_url.as_deref().map(Url::parse).transpose()?,
            timeout: self.timeout,
            credentials: self.credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(test: bool) -> GatewayConfig {
        GatewayConfig::builder("Acme")
            .test_mode(test)
            .live_url("https://api.acme.example/v1/")
            .test_url("https://sandbox.acme.example/v1/")
            .credential("login", "merchant")
            .credential("password", "s3cret")
            .build()
            .unwrap()
    }

    #[test]
    fn test_endpoint_follows_mode() {
        assert_eq!(
            config(true).endpoint().unwrap().as_str(),
            "https://sandbox.acme.example/v1/"
        );
        assert_eq!(
            config(false).endpoint_for("charges").unwrap().as_str(),
            "https://api.acme.example/v1/charges"
        );
    }

    #[test]
    fn test_require_reports_missing_keys() {
        let config = config(true);
        assert!(config.require(&["login", "password"]).is_ok());

        let err = config.require(&["login", "signature", "partner"]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("signature, partner"), "actual: {}", message);
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let rendered = format!("{:?}", config(true));
        assert!(rendered.contains("password"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = GatewayConfig::builder("Acme").live_url("not a url").build();
        assert!(matches!(result, Err(GatewayError::Url(_))));
    }

    #[test]
    fn test_missing_endpoint() {
        let config = GatewayConfig::builder("Acme").build().unwrap();
        assert!(config.endpoint_for("charges").is_err());
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
    }
}
