//! Error types for the Moneris gateway client.
//!
//! All errors implement the standard [`std::error::Error`] trait via [`thiserror::Error`].
//!
//! # Error Categories
//!
//! - **Configuration Errors** ([`GatewayError::ConfigurationError`],
//!   [`GatewayError::MissingReference`]): raised before any network call
//! - **Validation Errors** ([`GatewayError::InvalidInput`]): bad card data, amounts or order ids
//! - **Unsupported Operations** ([`GatewayError::NotSupported`]): raised immediately, no I/O
//! - **Network Errors** ([`GatewayError::HttpError`]): the request never reached the processor
//!
//! A request that was actually sent never produces an error. Declines, timeouts and
//! malformed processor replies are reported as a failed
//! [`TransactionResult`](crate::models::TransactionResult) instead.
//!
//! # Examples
//!
//! ```
//! use moneris_gateway::error::{GatewayError, Result};
//!
//! fn require_reference(reference: &str) -> Result<&str> {
//!     if reference.trim().is_empty() {
//!         return Err(GatewayError::MissingReference("capture needs a reference".to_owned()));
//!     }
//!     Ok(reference)
//! }
//!
//! assert!(require_reference("").unwrap_err().is_configuration_error());
//! ```

use thiserror::Error;

use crate::gateway::Operation;

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors that can occur before a transaction reaches the processor.
///
/// # Error Recovery
///
/// - **Configuration errors**: fix settings or environment variables; never retry blindly
/// - **Validation errors**: fix the input and resubmit
/// - **Network errors** ([`HttpError`](Self::HttpError)): the request did not leave the
///   process, so resubmitting cannot double-charge
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Gateway configuration is invalid or incomplete.
    ///
    /// Common causes include:
    /// - Store ID or API token missing, or resolving to an empty value
    /// - Referenced environment variable not set
    /// - Endpoint override that is not HTTPS
    #[error("Gateway configuration error: {0}")]
    ConfigurationError(String),

    /// A capture or refund has no prior transaction reference to act on.
    ///
    /// This is treated as a configuration error: the host failed to link the
    /// operation to a successful authorization or purchase.
    #[error("Missing transaction reference: {0}")]
    MissingReference(String),

    /// Caller-supplied data failed validation.
    ///
    /// # Examples
    ///
    /// ```
    /// use moneris_gateway::error::GatewayError;
    ///
    /// let err = GatewayError::InvalidInput("card number must contain only digits".to_owned());
    /// assert!(err.to_string().contains("Invalid input"));
    /// ```
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The operation is not supported by this gateway.
    #[error("{0} is not supported by the Moneris gateway")]
    NotSupported(Operation),

    /// HTTP request could not be delivered.
    ///
    /// Only produced when the request never reached the processor (DNS, connect
    /// or TLS failures). Timeouts after submission become an unknown-outcome result.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request serialization failed.
    #[error("Request encoding failed: {0}")]
    EncodingError(String),

    /// Transport configuration is invalid.
    #[error("Transport error: {0}")]
    TransportError(String),
}

impl GatewayError {
    /// Returns true for errors in the configuration category.
    ///
    /// Missing references count as configuration errors.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self, Self::ConfigurationError(_) | Self::MissingReference(_))
    }

    /// Returns true if the error was raised for an unsupported operation.
    #[must_use]
    pub const fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported(_))
    }
}
