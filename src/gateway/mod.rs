//! Payment gateway capability interface and the Moneris implementation.
//!
//! [`PaymentGateway`] is the contract a host order workflow programs
//! against. [`MonerisGateway`] is the only implementation; it is constructed
//! with its configuration and transport and handed to whoever needs it.
//!
//! # Operation flow
//!
//! Every supported operation runs the same steps, in order:
//!
//! 1. Validate the input (references, order ids, card data)
//! 2. Resolve credentials from configuration and the environment
//! 3. Build the processor request
//! 4. Submit it once, without retrying
//! 5. Normalize whatever came back into a [`TransactionResult`]
//!
//! Steps 1 to 3 fail with an error before any I/O. Once step 4 has sent the
//! request, the caller always gets a result.

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;
use std::fmt;

use serde::Serialize;

use crate::{
    error::{GatewayError, Result},
    models::{Amount, PaymentForm, PaymentInstrument, TransactionRequest, TransactionResult},
};

mod builder;
mod moneris;
mod normalize;

pub use moneris::MonerisGateway;
pub use normalize::{
    INVALID_RESPONSE_MESSAGE, TIMED_OUT_MESSAGE, UNPROCESSED_MESSAGE, normalize_response,
};

/// Gateway operations, supported or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Reserve funds.
    Authorize,
    /// Collect reserved funds.
    Capture,
    /// Authorize and capture in one step.
    Purchase,
    /// Return funds in full.
    Refund,
    /// Return part of the funds.
    PartialRefund,
    /// Finish an off-site authorization.
    CompleteAuthorize,
    /// Finish an off-site purchase.
    CompletePurchase,
    /// Tokenize a card for later use.
    CreatePaymentSource,
    /// Delete a stored token.
    DeletePaymentSource,
    /// Handle an inbound processor notification.
    Webhook,
}

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Authorize,
        Self::Capture,
        Self::Purchase,
        Self::Refund,
        Self::PartialRefund,
        Self::CompleteAuthorize,
        Self::CompletePurchase,
        Self::CreatePaymentSource,
        Self::DeletePaymentSource,
        Self::Webhook,
    ];
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Authorize => "authorize",
            Self::Capture => "capture",
            Self::Purchase => "purchase",
            Self::Refund => "refund",
            Self::PartialRefund => "partial refund",
            Self::CompleteAuthorize => "complete authorize",
            Self::CompletePurchase => "complete purchase",
            Self::CreatePaymentSource => "create payment source",
            Self::DeletePaymentSource => "delete payment source",
            Self::Webhook => "webhook",
        })
    }
}

/// Capability interface for a card payment gateway.
///
/// The four card operations are async and return a result for every request
/// that was sent. Operations a gateway does not offer have default
/// implementations that fail with [`GatewayError::NotSupported`] without any I/O.
///
/// # Examples
///
/// ```rust,no_run
/// use moneris_gateway::{
///     config::{Environment, GatewayConfig},
///     gateway::{MonerisGateway, Operation, PaymentGateway},
///     models::{Amount, PaymentInstrument, TransactionRequest},
/// };
///
/// # async fn example() -> moneris_gateway::error::Result<()> {
/// let config = GatewayConfig::new(Environment::Staging).with_credentials("store5", "yesguy");
/// let gateway = MonerisGateway::new(config)?;
/// assert!(gateway.supports(Operation::Purchase));
///
/// let request = TransactionRequest::new("ORD-1001", Amount::from_minor_units(2599)?)?;
/// let card = PaymentInstrument::new("4242424242424242", "1228", Some("123"))?;
///
/// let result = gateway.purchase(&request, card).await?;
/// if result.is_successful() {
///     println!("charged, reference {}", result.reference());
/// }
/// # Ok(())
/// # }
/// ```
pub trait PaymentGateway: Send + Sync {
    /// Reserves funds without capturing them.
    ///
    /// The instrument is consumed and wiped once the request is built.
    ///
    /// # Errors
    ///
    /// Returns error if the input or configuration is invalid, or the
    /// request could not be delivered.
    fn authorize<'a>(
        &'a self,
        request: &'a TransactionRequest,
        instrument: PaymentInstrument,
    ) -> impl Future<Output = Result<TransactionResult>> + Send + 'a;

    /// Collects funds reserved by the authorization identified by `reference`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingReference`] if `reference` is blank, and
    /// otherwise as [`authorize`](Self::authorize).
    fn capture<'a>(
        &'a self,
        reference: &'a str,
        amount: Amount,
        order_id: &'a str,
    ) -> impl Future<Output = Result<TransactionResult>> + Send + 'a;

    /// Authorizes and captures in one step.
    ///
    /// # Errors
    ///
    /// As [`authorize`](Self::authorize).
    fn purchase<'a>(
        &'a self,
        request: &'a TransactionRequest,
        instrument: PaymentInstrument,
    ) -> impl Future<Output = Result<TransactionResult>> + Send + 'a;

    /// Returns funds from the purchase or capture identified by `prior_reference`.
    ///
    /// Use [`RefundTarget::resolve`](crate::history::RefundTarget::resolve) to
    /// find the reference from the order history.
    ///
    /// # Errors
    ///
    /// As [`capture`](Self::capture).
    fn refund<'a>(
        &'a self,
        prior_reference: &'a str,
        amount: Amount,
        order_id: &'a str,
    ) -> impl Future<Output = Result<TransactionResult>> + Send + 'a;

    /// Returns true if the gateway offers `operation`.
    fn supports(&self, operation: Operation) -> bool;

    /// Finishes an off-site authorization.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotSupported`] unless overridden.
    fn complete_authorize(&self, _reference: &str) -> Result<TransactionResult> {
        Err(GatewayError::NotSupported(Operation::CompleteAuthorize))
    }

    /// Finishes an off-site purchase.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotSupported`] unless overridden.
    fn complete_purchase(&self, _reference: &str) -> Result<TransactionResult> {
        Err(GatewayError::NotSupported(Operation::CompletePurchase))
    }

    /// Tokenizes a card, returning the stored token.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotSupported`] unless overridden.
    fn create_payment_source(&self, _form: PaymentForm, _customer_id: &str) -> Result<String> {
        Err(GatewayError::NotSupported(Operation::CreatePaymentSource))
    }

    /// Deletes a stored token.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotSupported`] unless overridden.
    fn delete_payment_source(&self, _token: &str) -> Result<()> {
        Err(GatewayError::NotSupported(Operation::DeletePaymentSource))
    }

    /// Handles an inbound processor notification.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotSupported`] unless overridden.
    fn process_webhook(&self, _payload: &[u8]) -> Result<()> {
        Err(GatewayError::NotSupported(Operation::Webhook))
    }
}
