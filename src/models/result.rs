//! Canonical transaction results.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

/// Classification of a completed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The processor approved the transaction.
    Approved,
    /// The processor answered and did not approve.
    Declined,
    /// No usable answer: timed out, or the response was absent or malformed.
    ///
    /// The transaction may still have completed processor-side. Reconcile
    /// before resubmitting.
    Unknown,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => f.write_str("approved"),
            Self::Declined => f.write_str("declined"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Best-effort diagnostic fields. Absent values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultDetails {
    /// Receipt identifier.
    pub receipt_id: String,
    /// Issuer (ISO) response code.
    pub iso_code: String,
    /// Authorization code.
    pub auth_code: String,
    /// Card brand code.
    pub card_type: String,
    /// Transaction date.
    pub trans_date: String,
    /// Transaction time.
    pub trans_time: String,
    /// AVS result code.
    pub avs_result_code: String,
    /// CVD result code.
    pub cvd_result_code: String,
}

/// Result of one request/response exchange.
///
/// Immutable once built; reading it never changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionResult {
    successful: bool,
    outcome: Outcome,
    code: String,
    message: String,
    reference: String,
    details: ResultDetails,
}

impl TransactionResult {
    pub(crate) fn new(
        outcome: Outcome,
        code: String,
        message: String,
        reference: String,
        details: ResultDetails,
    ) -> Self {
        Self {
            successful: matches!(outcome, Outcome::Approved),
            outcome,
            code,
            message,
            reference,
            details,
        }
    }

    /// True when the processor approved the transaction.
    #[must_use]
    pub const fn is_successful(&self) -> bool {
        self.successful
    }

    /// Approved, declined or unknown.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Processor response code, empty when none was returned.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Processor reference for follow-up operations.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Diagnostic fields.
    #[must_use]
    pub const fn details(&self) -> &ResultDetails {
        &self.details
    }

    /// Flat key/value view for host storage.
    ///
    /// Keys: `response_code`, `message`, `transaction_number`, `receipt_id`,
    /// `iso_code`, `auth_code`, `card_type`, `trans_date`, `trans_time`.
    #[must_use]
    pub fn data(&self) -> BTreeMap<String, String> {
        [
            ("response_code", &self.code),
            ("message", &self.message),
            ("transaction_number", &self.reference),
            ("receipt_id", &self.details.receipt_id),
            ("iso_code", &self.details.iso_code),
            ("auth_code", &self.details.auth_code),
            ("card_type", &self.details.card_type),
            ("trans_date", &self.details.trans_date),
            ("trans_time", &self.details.trans_time),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.clone()))
        .collect()
    }
}

/// The result interface a host order workflow consumes.
///
/// Mirrors the generic payment-response contract of e-commerce platforms so
/// the gateway can be dropped in behind one.
pub trait PaymentResponse {
    /// True if the payment went through.
    fn is_successful(&self) -> bool;

    /// True if the payment is still pending.
    fn is_processing(&self) -> bool {
        false
    }

    /// True if the customer must be redirected to finish the payment.
    fn is_redirect(&self) -> bool {
        false
    }

    /// Response code.
    fn code(&self) -> &str;

    /// Response message.
    fn message(&self) -> &str;

    /// Gateway transaction reference.
    fn transaction_reference(&self) -> &str;

    /// Response data to persist with the host transaction.
    fn data(&self) -> BTreeMap<String, String>;
}

impl PaymentResponse for TransactionResult {
    fn is_successful(&self) -> bool {
        self.successful
    }

    fn code(&self) -> &str {
        &self.code
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn transaction_reference(&self) -> &str {
        &self.reference
    }

    fn data(&self) -> BTreeMap<String, String> {
        Self::data(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approved() -> TransactionResult {
        TransactionResult::new(
            Outcome::Approved,
            "027".to_owned(),
            "APPROVED".to_owned(),
            "660110910011139740".to_owned(),
            ResultDetails {
                receipt_id: "ORD-1".to_owned(),
                iso_code: "01".to_owned(),
                auth_code: "AB12".to_owned(),
                ..ResultDetails::default()
            },
        )
    }

    #[test]
    fn test_success_follows_outcome() {
        assert!(approved().is_successful());

        let declined = TransactionResult::new(
            Outcome::Declined,
            "481".to_owned(),
            "DECLINED".to_owned(),
            String::new(),
            ResultDetails::default(),
        );
        assert!(!declined.is_successful());
        assert_eq!(declined.outcome(), Outcome::Declined);
    }

    #[test]
    fn test_data_keys() {
        let data = approved().data();
        let keys: Vec<&str> = data.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            [
                "auth_code",
                "card_type",
                "iso_code",
                "message",
                "receipt_id",
                "response_code",
                "trans_date",
                "trans_time",
                "transaction_number",
            ]
        );
        assert_eq!(data["transaction_number"], "660110910011139740");
        assert_eq!(data["card_type"], "");
    }

    #[test]
    fn test_payment_response_defaults() {
        let result = approved();
        let response: &dyn PaymentResponse = &result;
        assert!(response.is_successful());
        assert!(!response.is_processing());
        assert!(!response.is_redirect());
        assert_eq!(response.code(), "027");
        assert_eq!(response.transaction_reference(), "660110910011139740");
        assert_eq!(response.data(), result.data());
    }

    #[test]
    fn test_serializes_for_host_storage() {
        let json = serde_json::to_value(approved()).unwrap();
        assert_eq!(json["outcome"], "approved");
        assert_eq!(json["details"]["iso_code"], "01");
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Unknown.to_string(), "unknown");
    }
}
