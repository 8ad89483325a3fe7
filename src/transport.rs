//! Blocking HTTP transport for adapters
//!
//! Every reply is returned as a [`RawResponse`], whatever its status, so the
//! normalizer can decide what a non-2xx body means. Only a failure to obtain
//! a reply at all becomes [`GatewayError::Transport`].

use crate::config::GatewayConfig;
use crate::{GatewayError, Result};
use http::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Serialize;
use tracing::debug;

/// Status and body of one HTTP reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Blocking HTTP client configured from a [`GatewayConfig`]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport honoring the configured timeout
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GatewayError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// POST a JSON body
    pub fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        headers: &[(&str, &str)],
    ) -> Result<RawResponse> {
        self.send(with_headers(self.client.post(url).json(body), headers))
    }

    /// POST a form-encoded body
    pub fn post_form<T: Serialize + ?Sized>(
        &self,
        url: &str,
        form: &T,
        headers: &[(&str, &str)],
    ) -> Result<RawResponse> {
        self.send(with_headers(self.client.post(url).form(form), headers))
    }

    /// POST a pre-rendered body (XML, SOAP, delimited)
    pub fn post_body(
        &self,
        url: &str,
        content_type: &str,
        body: impl Into<String>,
        headers: &[(&str, &str)],
    ) -> Result<RawResponse> {
        let request = self
            .client
            .post(url)
            .header(http::header::CONTENT_TYPE, content_type)
            .body(body.into());
        self.send(with_headers(request, headers))
    }

    /// GET a resource
    pub fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<RawResponse> {
        self.send(with_headers(self.client.get(url), headers))
    }

    fn send(&self, request: RequestBuilder) -> Result<RawResponse> {
        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;

        debug!(status = status.as_u16(), bytes = body.len(), "received reply");
        Ok(RawResponse { status, body })
    }
}

fn with_headers(mut request: RequestBuilder, headers: &[(&str, &str)]) -> RequestBuilder {
    for (key, value) in headers {
        request = request.header(*key, *value);
    }
    request
}
