//! Transaction request inputs supplied by the host.

use serde::{Deserialize, Serialize};

use super::Amount;
use crate::error::{GatewayError, Result};

/// Maximum order id length accepted by the processor.
pub const MAX_ORDER_ID_LEN: usize = 50;

/// Order-level data for an authorize or purchase.
///
/// Card data travels separately as a [`PaymentInstrument`](super::PaymentInstrument)
/// so it can be dropped as soon as the processor request is built.
///
/// # Examples
///
/// ```
/// use moneris_gateway::models::{Amount, BillingAddress, TransactionRequest};
///
/// let request = TransactionRequest::new("ORD-1001", Amount::from_minor_units(2599).unwrap())
///     .unwrap()
///     .with_customer_id("buyer@example.com")
///     .with_billing_address(BillingAddress::new("123 Main Street", "M5V 2T6"));
///
/// assert_eq!(request.order_id(), "ORD-1001");
/// assert_eq!(request.amount().to_processor_string(), "25.99");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    order_id: String,
    amount: Amount,
    customer_id: Option<String>,
    billing_address: Option<BillingAddress>,
    crypt_type: Option<String>,
}

impl TransactionRequest {
    /// Creates a request for `order_id` and `amount`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidInput`] if the order id is empty or too long.
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn new(order_id: impl Into<String>, amount: Amount) -> Result<Self> {
        let order_id = validate_order_id(order_id.into())?;
        Ok(Self { order_id, amount, customer_id: None, billing_address: None, crypt_type: None })
    }

    /// Sets the customer identifier (typically the order e-mail).
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        let customer_id = customer_id.into();
        self.customer_id = (!customer_id.trim().is_empty()).then_some(customer_id);
        self
    }

    /// Sets the billing address used for AVS.
    #[must_use]
    pub fn with_billing_address(mut self, address: BillingAddress) -> Self {
        self.billing_address = Some(address);
        self
    }

    /// Overrides the configured encryption type indicator for this request.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_crypt_type(mut self, crypt_type: impl Into<String>) -> Self {
        self.crypt_type = Some(crypt_type.into());
        self
    }

    /// Order identifier.
    #[must_use]
    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    /// Amount to authorize or charge.
    #[must_use]
    pub const fn amount(&self) -> Amount {
        self.amount
    }

    /// Customer identifier, if any.
    #[must_use]
    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    /// Billing address, if any.
    #[must_use]
    pub const fn billing_address(&self) -> Option<&BillingAddress> {
        self.billing_address.as_ref()
    }

    /// Encryption type override, if any.
    #[must_use]
    pub fn crypt_type(&self) -> Option<&str> {
        self.crypt_type.as_deref()
    }
}

/// Validates an order id, returning it trimmed.
pub(crate) fn validate_order_id(order_id: String) -> Result<String> {
    let trimmed = order_id.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::InvalidInput("order id is required".to_owned()));
    }
    if trimmed.len() > MAX_ORDER_ID_LEN {
        return Err(GatewayError::InvalidInput(format!(
            "order id must be at most {MAX_ORDER_ID_LEN} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

/// Billing address fragment the host provides for AVS.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingAddress {
    /// First address line, e.g. `"123 Main Street"`.
    pub address1: Option<String>,
    /// Postal or ZIP code.
    pub postal_code: Option<String>,
}

impl BillingAddress {
    /// Creates an address from its first line and postal code.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn new(address1: impl Into<String>, postal_code: impl Into<String>) -> Self {
        Self { address1: Some(address1.into()), postal_code: Some(postal_code.into()) }
    }
}

/// Address Verification fields derived from a billing address.
///
/// When AVS is enabled these are always sent, empty or not: leaving them out
/// would turn the processor-side check off instead of letting it run on
/// whatever data is available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvsFields {
    /// Leading house number of the street line.
    pub street_number: String,
    /// Street line with the house number removed.
    pub street_name: String,
    /// Postal or ZIP code.
    pub zip_code: String,
}

impl AvsFields {
    /// Derives AVS fields from an optional billing address.
    ///
    /// # Examples
    ///
    /// ```
    /// use moneris_gateway::models::{AvsFields, BillingAddress};
    ///
    /// let address = BillingAddress::new("201 Michigan Ave", "M1M1M1");
    /// let avs = AvsFields::from_address(Some(&address));
    /// assert_eq!(avs.street_number, "201");
    /// assert_eq!(avs.street_name, "Michigan Ave");
    /// assert_eq!(avs.zip_code, "M1M1M1");
    ///
    /// assert_eq!(AvsFields::from_address(None), AvsFields::default());
    /// ```
    #[must_use]
    pub fn from_address(address: Option<&BillingAddress>) -> Self {
        let Some(address) = address else {
            return Self::default();
        };
        let line = address.address1.as_deref().unwrap_or_default();

        Self {
            street_number: extract_street_number(line).to_owned(),
            street_name: extract_street_name(line).to_owned(),
            zip_code: address.postal_code.clone().unwrap_or_default(),
        }
    }
}

/// Returns the leading run of ASCII digits.
fn extract_street_number(line: &str) -> &str {
    let end = line.find(|c: char| !c.is_ascii_digit()).unwrap_or(line.len());
    &line[..end]
}

/// Strips a leading house number only when whitespace follows it.
fn extract_street_name(line: &str) -> &str {
    let number = extract_street_number(line);
    if number.is_empty() {
        return line;
    }
    let rest = &line[number.len()..];
    let trimmed = rest.trim_start();
    if trimmed.len() == rest.len() {
        line
    } else {
        trimmed
    }
}
