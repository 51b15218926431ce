//! Host transaction boundary.
//!
//! The host order system owns transactions and their history. These types
//! describe the slice of it the gateway reads: the transaction being
//! processed, its parent, and the order's earlier transactions when a refund
//! must find what it reverses.

use serde::{Deserialize, Serialize};

use crate::{
    error::{GatewayError, Result},
    models::{Amount, BillingAddress, TransactionRequest},
};

/// Kind of a host transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Funds reserved.
    Authorize,
    /// Reserved funds collected.
    Capture,
    /// Authorize and capture in one step.
    Purchase,
    /// Funds returned.
    Refund,
}

impl TransactionKind {
    /// True for kinds that move funds to the merchant and can be refunded.
    #[must_use]
    pub const fn is_refundable(self) -> bool {
        matches!(self, Self::Purchase | Self::Capture)
    }
}

/// Status of a host transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Not yet submitted.
    Pending,
    /// Submitted, awaiting an answer.
    Processing,
    /// Approved.
    Success,
    /// Declined or errored.
    Failed,
}

/// One earlier transaction of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Host-side identifier.
    pub id: u64,
    /// Transaction kind.
    pub kind: TransactionKind,
    /// Transaction status.
    pub status: TransactionStatus,
    /// Processor reference, if one was returned.
    #[serde(default)]
    pub reference: Option<String>,
    /// Order number the transaction was submitted under.
    pub order_number: String,
}

impl TransactionRecord {
    /// Non-blank processor reference.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref().map(str::trim).filter(|r| !r.is_empty())
    }

    /// True if a refund can be issued against this transaction.
    #[must_use]
    pub fn is_refund_source(&self) -> bool {
        self.kind.is_refundable()
            && self.status == TransactionStatus::Success
            && self.reference().is_some()
    }
}

/// The host transaction being processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostTransaction {
    /// Order number.
    pub order_number: String,
    /// Customer e-mail on the order.
    #[serde(default)]
    pub customer_email: Option<String>,
    /// Amount of this transaction.
    pub payment_amount: Amount,
    /// Billing address on the order.
    #[serde(default)]
    pub billing_address: Option<BillingAddress>,
    /// Parent transaction, for captures and refunds.
    #[serde(default)]
    pub parent: Option<TransactionRecord>,
}

impl HostTransaction {
    /// Builds the order-level request for an authorize or purchase.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidInput`] if the order number is invalid.
    pub fn to_request(&self) -> Result<TransactionRequest> {
        let mut request = TransactionRequest::new(self.order_number.as_str(), self.payment_amount)?;
        if let Some(ref email) = self.customer_email {
            request = request.with_customer_id(email.as_str());
        }
        if let Some(ref address) = self.billing_address {
            request = request.with_billing_address(address.clone());
        }
        Ok(request)
    }
}

/// What a refund reverses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundTarget {
    /// Processor reference of the original purchase or capture.
    pub reference: String,
    /// Order id the original was submitted under.
    pub order_id: String,
}

impl RefundTarget {
    /// Resolves the transaction a refund should reverse.
    ///
    /// A parent with a reference wins. Otherwise the most recent successful
    /// purchase or capture in `history` (oldest first) that has a reference
    /// is used. The refund is issued under the original's order number,
    /// falling back to the refunding transaction's own.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingReference`] if nothing qualifies.
    ///
    /// # Examples
    ///
    /// ```
    /// use moneris_gateway::history::{
    ///     HostTransaction, RefundTarget, TransactionKind, TransactionRecord, TransactionStatus,
    /// };
    /// use moneris_gateway::models::Amount;
    ///
    /// let history = vec![TransactionRecord {
    ///     id: 1,
    ///     kind: TransactionKind::Purchase,
    ///     status: TransactionStatus::Success,
    ///     reference: Some("660110910011139740".to_owned()),
    ///     order_number: "ORD-1".to_owned(),
    /// }];
    /// let refund = HostTransaction {
    ///     order_number: "ORD-1".to_owned(),
    ///     customer_email: None,
    ///     payment_amount: Amount::from_minor_units(500).unwrap(),
    ///     billing_address: None,
    ///     parent: None,
    /// };
    ///
    /// let target = RefundTarget::resolve(&refund, &history).unwrap();
    /// assert_eq!(target.reference, "660110910011139740");
    /// ```
    pub fn resolve(transaction: &HostTransaction, history: &[TransactionRecord]) -> Result<Self> {
        let parent = transaction.parent.as_ref().filter(|p| p.reference().is_some());
        let source = parent.or_else(|| history.iter().rev().find(|r| r.is_refund_source()));

        let Some(source) = source else {
            return Err(GatewayError::MissingReference(format!(
                "cannot refund order {}: no successful purchase or capture with a reference",
                transaction.order_number
            )));
        };

        let reference = source.reference().unwrap_or_default().to_owned();
        let order_id = if source.order_number.trim().is_empty() {
            transaction.order_number.clone()
        } else {
            source.order_number.clone()
        };

        Ok(Self { reference, order_id })
    }
}
