//! Settings for the HTTPS link to the Moneris gateway.
//!
//! Read from the `[http]` table of [`GatewayConfig`](crate::config::GatewayConfig).
//! The two timeouts split failures into two kinds. A connect timeout means
//! nothing reached the processor and surfaces as an error. A request timeout
//! after the envelope was sent yields a result with an unknown outcome, which
//! the host must reconcile rather than resubmit.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{GatewayError, Result};

/// Upper bound for `timeout_secs`.
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// Upper bound for `connect_timeout_secs`.
pub const MAX_CONNECT_TIMEOUT_SECS: u64 = 60;

/// `[http]` settings.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use moneris_gateway::{config::GatewayConfig, transport::HttpVersion};
///
/// let config = GatewayConfig::from_toml(r#"
///     environment = "staging"
///
///     [http]
///     timeout_secs = 45
///     http_version = "http1"
/// "#).unwrap();
///
/// assert_eq!(config.http.timeout(), Duration::from_secs(45));
/// assert_eq!(config.http.connect_timeout(), Duration::from_secs(10));
/// assert_eq!(config.http.http_version, HttpVersion::Http1);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Idle keep-alive connections kept open to the gateway host.
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle_per_host: usize,

    /// Time allowed for a submitted transaction to be answered.
    ///
    /// Exceeding it yields an unknown-outcome result, not an error.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Time allowed to open the connection before anything is sent.
    ///
    /// Exceeding it is a [`GatewayError::HttpError`] and the transaction may be
    /// resubmitted.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Protocol used to reach the gateway.
    #[serde(default)]
    pub http_version: HttpVersion,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: default_pool_max_idle(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            http_version: HttpVersion::default(),
        }
    }
}

impl HttpConfig {
    /// Checks the timeouts against their bounds.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TransportError`] naming the offending `[http]` key when:
    /// - `timeout_secs` is outside `1..=`[`MAX_TIMEOUT_SECS`]
    /// - `connect_timeout_secs` is outside `1..=`[`MAX_CONNECT_TIMEOUT_SECS`]
    /// - `connect_timeout_secs` exceeds `timeout_secs`
    pub fn validate(&self) -> Result<()> {
        check_range("timeout_secs", self.timeout_secs, MAX_TIMEOUT_SECS)?;
        check_range("connect_timeout_secs", self.connect_timeout_secs, MAX_CONNECT_TIMEOUT_SECS)?;

        if self.connect_timeout_secs > self.timeout_secs {
            return Err(GatewayError::TransportError(format!(
                "[http] connect_timeout_secs ({}) must not exceed timeout_secs ({})",
                self.connect_timeout_secs, self.timeout_secs
            )));
        }
        Ok(())
    }

    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn check_range(key: &str, value: u64, max: u64) -> Result<()> {
    if (1..=max).contains(&value) {
        Ok(())
    } else {
        Err(GatewayError::TransportError(format!(
            "[http] {key} must be between 1 and {max}, got {value}"
        )))
    }
}

/// Protocol used to reach the gateway.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HttpVersion {
    /// HTTP/1.1 only.
    Http1,
    /// HTTP/2 with prior knowledge.
    Http2,
    /// Let TLS negotiation pick.
    #[default]
    Auto,
}

const fn default_pool_max_idle() -> usize {
    10
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_config_default() {
        let config = HttpConfig::default();
        assert_eq!(config.pool_max_idle_per_host, 10);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.http_version, HttpVersion::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_http_config_from_toml() {
        let toml = "
            pool_max_idle_per_host = 2
            timeout_secs = 45
            connect_timeout_secs = 15
            http_version = \"http1\"
        ";

        let config: HttpConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.pool_max_idle_per_host, 2);
        assert_eq!(config.timeout_secs, 45);
        assert_eq!(config.connect_timeout_secs, 15);
        assert_eq!(config.http_version, HttpVersion::Http1);
    }

    #[test]
    fn test_http_config_partial_fields() {
        let config: HttpConfig = toml::from_str("timeout_secs = 60").unwrap();
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.http_version, HttpVersion::Auto);
    }

    #[test]
    fn test_http_version_invalid_value() {
        let result: std::result::Result<HttpConfig, _> = toml::from_str("http_version = \"http3\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_http_config_validate_bounds() {
        let mut config = HttpConfig { timeout_secs: 1, connect_timeout_secs: 1, ..HttpConfig::default() };
        assert!(config.validate().is_ok());

        config.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(GatewayError::TransportError(_))));

        config.timeout_secs = 301;
        assert!(matches!(config.validate(), Err(GatewayError::TransportError(_))));

        config.timeout_secs = 30;
        config.connect_timeout_secs = 61;
        assert!(matches!(config.validate(), Err(GatewayError::TransportError(_))));
    }

    #[test]
    fn test_connect_timeout_above_request_timeout_rejected() {
        let config = HttpConfig { timeout_secs: 5, connect_timeout_secs: 10, ..HttpConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bound_errors_name_the_key() {
        let config = HttpConfig { timeout_secs: MAX_TIMEOUT_SECS + 1, ..HttpConfig::default() };
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "Transport error: [http] timeout_secs must be between 1 and 300, got 301"
        );

        let config = HttpConfig { connect_timeout_secs: 0, ..HttpConfig::default() };
        assert!(config.validate().unwrap_err().to_string().contains("connect_timeout_secs"));
    }

    #[test]
    fn test_gateway_settings_reject_bad_http_table() {
        let config = crate::config::GatewayConfig::from_toml(
            "
            [http]
            timeout_secs = 5
            connect_timeout_secs = 20
            ",
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("[http] connect_timeout_secs (20) must not exceed timeout_secs (5)"));
    }
}
