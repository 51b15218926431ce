//! HTTPS transport using reqwest.

use reqwest::{Client, header::CONTENT_TYPE};
use tracing::instrument;

use super::{
    ProcessorRequest, RawResponse, SubmitTarget, Transport,
    config::{HttpConfig, HttpVersion},
    xml,
};
use crate::error::{GatewayError, Result};

const USER_AGENT: &str = concat!("moneris-gateway-rs/", env!("CARGO_PKG_VERSION"));

/// HTTP/1.1 and HTTP/2 transport using reqwest.
///
/// Supports connection pooling and keep-alive. One instance is meant to be
/// shared by every call a gateway makes.
///
/// # Examples
///
/// ```
/// use moneris_gateway::transport::{HttpConfig, HttpTransport, HttpVersion};
///
/// let config = HttpConfig {
///     pool_max_idle_per_host: 4,
///     timeout_secs: 45,
///     connect_timeout_secs: 10,
///     http_version: HttpVersion::Http1,
/// };
///
/// let transport = HttpTransport::with_config(&config).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    http_version: HttpVersion,
}

impl HttpTransport {
    /// Creates a transport with default settings.
    ///
    /// Default configuration:
    /// - Pool max idle per host: 10
    /// - Timeout: 30 seconds
    /// - Connect timeout: 10 seconds
    /// - HTTP version: Auto (prefer HTTP/2)
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Creates a transport with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is out of bounds or the HTTP client
    /// cannot be created.
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(USER_AGENT);

        builder = match config.http_version {
            HttpVersion::Http1 => builder.http1_only(),
            HttpVersion::Http2 => builder.http2_prior_knowledge(),
            HttpVersion::Auto => builder,
        };

        let client = builder.build().map_err(GatewayError::HttpError)?;

        Ok(Self { client, http_version: config.http_version })
    }

    #[instrument(
        skip(self, target, request),
        fields(
            txn_type = %request.txn_type(),
            endpoint = target.endpoint,
            test_mode = target.test_mode
        )
    )]
    async fn execute(
        &self,
        target: SubmitTarget<'_>,
        request: &ProcessorRequest,
    ) -> Result<Option<RawResponse>> {
        let body = xml::encode_request(target.credentials, request)?;

        let sent = self
            .client
            .post(target.endpoint)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(body.as_str().to_owned())
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) if e.is_connect() || e.is_builder() => {
                tracing::warn!(error = %e, "processor request was not delivered");
                return Err(GatewayError::HttpError(e));
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!("processor request timed out after submission, outcome unknown");
                return Ok(Some(RawResponse::timeout()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "processor request failed after submission");
                return Ok(None);
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "processor returned non-success status");
            return Ok(None);
        }

        match response.text().await {
            Ok(text) => Ok(xml::decode_response(&text)),
            Err(e) if e.is_timeout() => {
                tracing::warn!("processor response body timed out, outcome unknown");
                Ok(Some(RawResponse::timeout()))
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read processor response body");
                Ok(None)
            }
        }
    }
}

impl Transport for HttpTransport {
    async fn submit<'a>(
        &'a self,
        target: SubmitTarget<'a>,
        request: &'a ProcessorRequest,
    ) -> Result<Option<RawResponse>> {
        self.execute(target, request).await
    }

    fn protocol_name(&self) -> &'static str {
        match self.http_version {
            HttpVersion::Http1 => "http/1.1",
            HttpVersion::Http2 => "http/2",
            HttpVersion::Auto => "http",
        }
    }
}
