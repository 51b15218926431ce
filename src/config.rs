//! Gateway configuration types.
//!
//! This module defines the TOML-deserializable settings for the Moneris gateway
//! and the credential resolution rules.
//!
//! # Credential precedence
//!
//! Store ID and API token are resolved on every operation, never cached, so a
//! changed environment variable takes effect without a restart:
//!
//! 1. An explicit literal value in the configuration
//! 2. An environment reference in the configuration (`$VAR` or `${VAR}`)
//! 3. The default environment variable (`MONERIS_STORE_ID`, `MONERIS_API_TOKEN`)
//! 4. Otherwise a [`GatewayError::ConfigurationError`]
//!
//! # Examples
//!
//! ```
//! use moneris_gateway::config::{Environment, GatewayConfig};
//!
//! let toml = r#"
//!     environment = "production"
//!     enable_avs = true
//!     store_id = "$MONERIS_STORE"
//!     api_token = "${MONERIS_TOKEN}"
//! "#;
//!
//! let config = GatewayConfig::from_toml(toml).unwrap();
//! assert_eq!(config.environment, Environment::Production);
//! assert!(!config.is_test_mode());
//! assert!(config.enable_avs);
//! ```

use std::{
    collections::{BTreeSet, HashMap},
    fmt,
};

use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::{
    error::{GatewayError, Result},
    transport::HttpConfig,
};

/// Default environment variable holding the store ID.
pub const DEFAULT_STORE_ID_VAR: &str = "MONERIS_STORE_ID";

/// Default environment variable holding the API token.
pub const DEFAULT_API_TOKEN_VAR: &str = "MONERIS_API_TOKEN";

const STAGING_ENDPOINT: &str = "https://esqa.moneris.com/gateway2/servlet/MpgRequest";
const PRODUCTION_ENDPOINT: &str = "https://www3.moneris.com/gateway2/servlet/MpgRequest";

/// Processor environment.
///
/// Anything other than [`Environment::Production`] runs in test mode.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Moneris QA host, test mode.
    #[default]
    Staging,
    /// Live processing.
    Production,
}

impl Environment {
    /// Returns the processor endpoint for this environment.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Staging => STAGING_ENDPOINT,
            Self::Production => PRODUCTION_ENDPOINT,
        }
    }

    /// Returns true when requests should be flagged as test transactions.
    #[must_use]
    pub const fn is_test_mode(self) -> bool {
        !matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Staging => f.write_str("staging"),
            Self::Production => f.write_str("production"),
        }
    }
}

/// Source of environment variable values.
///
/// Injected into the gateway so credential resolution can be exercised
/// without touching the process environment.
pub trait EnvLookup: Send + Sync {
    /// Returns the value of `name`, or `None` when unset.
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// A credential setting: either a literal value or an environment reference.
///
/// Stored unresolved. Call [`CredentialRef::resolve`] at the point of use.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CredentialRef(String);

impl CredentialRef {
    /// Wraps a raw setting value.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the referenced variable name when the value is `$VAR` or `${VAR}`.
    #[must_use]
    pub fn env_var_name(&self) -> Option<&str> {
        let rest = self.0.trim().strip_prefix('$')?;
        let name = rest
            .strip_prefix('{')
            .and_then(|inner| inner.strip_suffix('}'))
            .unwrap_or(rest);
        Some(name)
    }

    /// Resolves the setting to its value.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigurationError`] if the value is empty, the
    /// variable name is malformed, or the referenced variable is unset or empty.
    pub fn resolve(&self, setting: &str, env: &dyn EnvLookup) -> Result<Zeroizing<String>> {
        let Some(name) = self.env_var_name() else {
            let literal = self.0.trim();
            if literal.is_empty() {
                return Err(GatewayError::ConfigurationError(format!("{setting} is empty")));
            }
            return Ok(Zeroizing::new(literal.to_owned()));
        };

        validate_env_var_name(setting, name)?;
        lookup_non_empty(setting, name, env)
    }
}

impl fmt::Debug for CredentialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.env_var_name() {
            Some(name) => write!(f, "CredentialRef(${name})"),
            None => f.write_str("CredentialRef(<literal>)"),
        }
    }
}

fn validate_env_var_name(setting: &str, name: &str) -> Result<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(GatewayError::ConfigurationError(format!(
            "{setting} references an invalid environment variable name: '{name}'"
        )));
    }
    Ok(())
}

fn lookup_non_empty(setting: &str, name: &str, env: &dyn EnvLookup) -> Result<Zeroizing<String>> {
    let value = Zeroizing::new(env.var(name).unwrap_or_default());
    if value.trim().is_empty() {
        return Err(GatewayError::ConfigurationError(format!(
            "{setting} resolves to an empty value (environment variable {name} is unset or empty)"
        )));
    }
    Ok(Zeroizing::new(value.trim().to_owned()))
}

/// Store ID and API token after resolution.
///
/// The token is wiped from memory on drop and never printed by `Debug`.
#[derive(Clone)]
pub struct ResolvedCredentials {
    store_id: String,
    api_token: Zeroizing<String>,
}

impl ResolvedCredentials {
    /// Builds resolved credentials, rejecting empty values.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigurationError`] if either value is empty.
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn new(store_id: impl Into<String>, api_token: impl Into<String>) -> Result<Self> {
        let store_id = store_id.into();
        let api_token = Zeroizing::new(api_token.into());
        if store_id.trim().is_empty() || api_token.trim().is_empty() {
            return Err(GatewayError::ConfigurationError(
                "Store ID and API token must both be non-empty".to_owned(),
            ));
        }
        Ok(Self { store_id, api_token })
    }

    /// Store identifier.
    #[must_use]
    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    /// API token.
    #[must_use]
    pub fn api_token(&self) -> &str {
        &self.api_token
    }
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("store_id", &self.store_id)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// Response codes the processor uses to signal an approval.
///
/// Kept as data rather than hard-coded so a different code set can be
/// configured without a release.
///
/// Codes are trimmed on construction and on deserialization.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(from = "Vec<String>")]
pub struct ApprovalCodes(BTreeSet<String>);

impl ApprovalCodes {
    /// Builds a code set from any iterator of codes.
    #[must_use]
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(codes.into_iter().map(|c| c.into().trim().to_owned()).collect())
    }

    /// Returns true if `code` is an approval.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.0.contains(code.trim())
    }

    /// Number of configured codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no codes are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn has_blank(&self) -> bool {
        self.0.iter().any(String::is_empty)
    }
}

impl From<Vec<String>> for ApprovalCodes {
    fn from(codes: Vec<String>) -> Self {
        Self::new(codes)
    }
}

impl Default for ApprovalCodes {
    fn default() -> Self {
        Self::new(["027", "001"])
    }
}

/// Root gateway configuration.
///
/// A plain immutable settings struct passed explicitly to
/// [`MonerisGateway::new`](crate::gateway::MonerisGateway::new).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Processor environment (`staging` or `production`).
    pub environment: Environment,

    /// Send Address Verification fields on authorize and purchase.
    pub enable_avs: bool,

    /// Require a card security code on authorize and purchase.
    pub enable_cvd: bool,

    /// Store ID setting (literal or environment reference).
    pub store_id: Option<CredentialRef>,

    /// API token setting (literal or environment reference).
    pub api_token: Option<CredentialRef>,

    /// Response codes treated as approvals.
    pub approval_codes: ApprovalCodes,

    /// Electronic commerce indicator sent with card transactions.
    pub crypt_type: String,

    /// Endpoint override; defaults to the environment's endpoint.
    pub endpoint: Option<String>,

    /// HTTP transport settings.
    pub http: HttpConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            enable_avs: false,
            enable_cvd: false,
            store_id: None,
            api_token: None,
            approval_codes: ApprovalCodes::default(),
            crypt_type: "7".to_owned(),
            endpoint: None,
            http: HttpConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Creates a configuration for `environment` with all other settings defaulted.
    #[must_use]
    pub fn new(environment: Environment) -> Self {
        Self { environment, ..Self::default() }
    }

    /// Parses configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigurationError`] if the TOML is malformed or
    /// holds an unknown environment.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| GatewayError::ConfigurationError(format!("invalid gateway settings: {e}")))
    }

    /// Sets both credential settings.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_credentials(
        mut self,
        store_id: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        self.store_id = Some(CredentialRef::new(store_id));
        self.api_token = Some(CredentialRef::new(api_token));
        self
    }

    /// Enables or disables AVS.
    #[must_use]
    pub const fn with_avs(mut self, enabled: bool) -> Self {
        self.enable_avs = enabled;
        self
    }

    /// Enables or disables the CVD requirement.
    #[must_use]
    pub const fn with_cvd(mut self, enabled: bool) -> Self {
        self.enable_cvd = enabled;
        self
    }

    /// Replaces the approval code set.
    #[must_use]
    pub fn with_approval_codes(mut self, codes: ApprovalCodes) -> Self {
        self.approval_codes = codes;
        self
    }

    /// Returns true unless running against production.
    #[must_use]
    pub const fn is_test_mode(&self) -> bool {
        self.environment.is_test_mode()
    }

    /// Returns the endpoint requests are posted to.
    #[must_use]
    pub fn endpoint_url(&self) -> &str {
        self.endpoint.as_deref().unwrap_or_else(|| self.environment.endpoint())
    }

    /// Validates static settings.
    ///
    /// Checks that:
    /// - An endpoint override is an HTTPS, non-loopback URL
    /// - At least one approval code is configured
    /// - `crypt_type` is a single digit
    /// - HTTP timeouts are within bounds
    ///
    /// Credentials are not checked here; see [`Self::validate_credentials`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigurationError`] on the first failed check.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref endpoint) = self.endpoint {
            validate_endpoint(endpoint)?;
        }

        if self.approval_codes.is_empty() {
            return Err(GatewayError::ConfigurationError(
                "approval_codes must contain at least one code".to_owned(),
            ));
        }

        if self.approval_codes.has_blank() {
            return Err(GatewayError::ConfigurationError(
                "approval_codes must not contain blank codes".to_owned(),
            ));
        }

        if self.crypt_type.len() != 1 || !self.crypt_type.chars().all(|c| c.is_ascii_digit()) {
            return Err(GatewayError::ConfigurationError(format!(
                "crypt_type must be a single digit, got '{}'",
                self.crypt_type
            )));
        }

        self.http.validate().map_err(|e| match e {
            GatewayError::TransportError(message) => GatewayError::ConfigurationError(message),
            other => other,
        })
    }

    /// Checks that both credentials currently resolve to non-empty values.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigurationError`] naming the missing credential.
    pub fn validate_credentials(&self, env: &dyn EnvLookup) -> Result<()> {
        self.resolve_credentials(env).map(drop)
    }

    /// Resolves store ID and API token following the documented precedence.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigurationError`] if either credential is
    /// missing or empty after resolution.
    pub fn resolve_credentials(&self, env: &dyn EnvLookup) -> Result<ResolvedCredentials> {
        let store_id = resolve_setting(self.store_id.as_ref(), "Store ID", DEFAULT_STORE_ID_VAR, env)?;
        let api_token =
            resolve_setting(self.api_token.as_ref(), "API token", DEFAULT_API_TOKEN_VAR, env)?;
        ResolvedCredentials::new(store_id.as_str(), api_token.as_str())
    }
}

fn resolve_setting(
    setting: Option<&CredentialRef>,
    label: &str,
    default_var: &str,
    env: &dyn EnvLookup,
) -> Result<Zeroizing<String>> {
    match setting {
        Some(credential) => credential.resolve(label, env),
        None => lookup_non_empty(label, default_var, env).map_err(|_| {
            GatewayError::ConfigurationError(format!(
                "{label} is required. Set it in the gateway settings or the {default_var} environment variable."
            ))
        }),
    }
}

fn validate_endpoint(endpoint: &str) -> Result<()> {
    let url = Url::parse(endpoint).map_err(|e| {
        GatewayError::ConfigurationError(format!("invalid endpoint '{endpoint}': {e}"))
    })?;

    if url.scheme() != "https" {
        return Err(GatewayError::ConfigurationError(format!(
            "endpoint must use HTTPS, got: {}",
            url.scheme()
        )));
    }

    if let Some(host) = url.host_str() {
        let host_lower = host.to_lowercase();
        if host_lower == "localhost"
            || host_lower.starts_with("127.")
            || host_lower == "::1"
            || host_lower == "[::1]"
        {
            return Err(GatewayError::ConfigurationError(format!(
                "endpoint must not be localhost or loopback: {host}"
            )));
        }
    }

    Ok(())
}
