//! Audit logging for payment operations.
//!
//! Every operation emits an attempt event and exactly one terminal event on
//! the `audit` tracing target, tied together by a correlation id. Events
//! never carry card data or the API token.

use std::time::{Duration, SystemTime};

use serde::Serialize;
use uuid::Uuid;

use crate::{gateway::Operation, models::Outcome};

/// Types of auditable events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// A request is about to be submitted.
    TransactionAttempted,
    /// The processor approved the transaction.
    TransactionApproved,
    /// The processor declined the transaction.
    TransactionDeclined,
    /// No usable answer was received; reconcile before retrying.
    OutcomeUnknown,
    /// The operation failed before anything was sent.
    TransactionRejected,
    /// An unsupported operation was requested.
    OperationNotSupported,
}

impl From<Outcome> for AuditEventType {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Approved => Self::TransactionApproved,
            Outcome::Declined => Self::TransactionDeclined,
            Outcome::Unknown => Self::OutcomeUnknown,
        }
    }
}

/// Details for an audit log entry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditDetails {
    /// Order identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Amount as sent to the processor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// Masked card number (`****1234`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
    /// Processor response code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_code: Option<String>,
    /// Processor reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Error message, card numbers redacted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Round-trip time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Audit log entry.
///
/// # Examples
///
/// ```
/// use moneris_gateway::{
///     gateway::Operation,
///     security::audit::{AuditEvent, AuditEventType, audit_log},
/// };
/// use uuid::Uuid;
///
/// let event = AuditEvent::new(AuditEventType::TransactionAttempted, Operation::Purchase, Uuid::new_v4())
///     .with_order_id("ORD-1001")
///     .with_amount("25.99")
///     .with_card("****4242");
///
/// audit_log(&event);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// When the event occurred.
    pub timestamp: SystemTime,
    /// What happened.
    pub event_type: AuditEventType,
    /// Which gateway operation.
    pub operation: Operation,
    /// Correlation id shared by all events of one operation call.
    pub request_id: Uuid,
    /// Whether the call targets the QA environment.
    pub test_mode: bool,
    /// Contextual details.
    pub details: AuditDetails,
}

impl AuditEvent {
    /// Creates a new audit event.
    #[must_use]
    pub fn new(event_type: AuditEventType, operation: Operation, request_id: Uuid) -> Self {
        Self {
            timestamp: SystemTime::now(),
            event_type,
            operation,
            request_id,
            test_mode: false,
            details: AuditDetails::default(),
        }
    }

    /// Marks the event as belonging to a test-mode call.
    #[must_use]
    pub const fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    /// Adds the order id.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.details.order_id = Some(order_id.into());
        self
    }

    /// Adds the amount.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
        self.details.amount = Some(amount.into());
        self
    }

    /// Adds a card descriptor.
    ///
    /// Anything that looks like a full card number is masked.
    #[must_use]
    pub fn with_card(mut self, card: &str) -> Self {
        self.details.card = Some(redact_card_numbers(card));
        self
    }

    /// Adds the processor response code.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_response_code(mut self, code: impl Into<String>) -> Self {
        self.details.response_code = Some(code.into());
        self
    }

    /// Adds the processor reference.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.details.reference = Some(reference.into());
        self
    }

    /// Adds an error message, redacting card numbers.
    #[must_use]
    pub fn with_error(mut self, error: &str) -> Self {
        self.details.error = Some(redact_card_numbers(error));
        self
    }

    /// Adds the round-trip duration.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "duration in ms fits u64 for practical values"
    )]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.details.duration_ms = Some(duration.as_millis() as u64);
        self
    }
}

/// Logs an audit event to tracing with target "audit".
pub fn audit_log(event: &AuditEvent) {
    tracing::info!(
        target: "audit",
        timestamp = ?event.timestamp,
        event_type = ?event.event_type,
        operation = %event.operation,
        request_id = %event.request_id,
        test_mode = event.test_mode,
        details = ?event.details,
        "AUDIT"
    );
}

/// Masks card numbers in free text, keeping the last four digits.
///
/// A card number is a run of 13 to 19 digits, optionally grouped with single
/// spaces or dashes.
///
/// # Examples
///
/// ```
/// use moneris_gateway::security::audit::redact_card_numbers;
///
/// assert_eq!(redact_card_numbers("pan=4242424242424242"), "pan=************4242");
/// assert_eq!(redact_card_numbers("card 4242-4242-4242-4242 declined"), "card ****-****-****-4242 declined");
/// assert_eq!(redact_card_numbers("order 12345 failed"), "order 12345 failed");
/// ```
#[must_use]
pub fn redact_card_numbers(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let end = digit_run_end(&chars, i);
        let digits = chars[i..end].iter().filter(|c| c.is_ascii_digit()).count();

        if (13..=19).contains(&digits) {
            mask_digits(&chars[i..end], digits, &mut out);
        } else {
            // Grouping did not form a card number; check each ungrouped segment.
            for segment in chars[i..end].split_inclusive(|c| !c.is_ascii_digit()) {
                let count = segment.iter().filter(|c| c.is_ascii_digit()).count();
                if (13..=19).contains(&count) {
                    mask_digits(segment, count, &mut out);
                } else {
                    out.extend(segment);
                }
            }
        }
        i = end;
    }

    out
}

/// Copies `run`, replacing all but the last four of its `digits` digits with `*`.
fn mask_digits(run: &[char], digits: usize, out: &mut String) {
    let mut remaining = digits;
    for &c in run {
        if c.is_ascii_digit() {
            out.push(if remaining > 4 { '*' } else { c });
            remaining -= 1;
        } else {
            out.push(c);
        }
    }
}

/// End of a digit run starting at `start`, allowing single separators between digits.
fn digit_run_end(chars: &[char], start: usize) -> usize {
    let mut end = start;
    while end < chars.len() {
        if chars[end].is_ascii_digit() {
            end += 1;
        } else if matches!(chars[end], ' ' | '-')
            && chars.get(end + 1).is_some_and(char::is_ascii_digit)
        {
            end += 1;
        } else {
            break;
        }
    }
    end
}

/// Convenience macro for audit logging.
///
/// # Examples
///
/// ```
/// use moneris_gateway::{audit, gateway::Operation, security::audit::AuditEventType};
/// use uuid::Uuid;
///
/// audit!(AuditEventType::OperationNotSupported, Operation::CompleteAuthorize, Uuid::new_v4());
///
/// audit!(
///     AuditEventType::TransactionAttempted,
///     Operation::Capture,
///     Uuid::new_v4(),
///     with_order_id("ORD-1"),
///     with_amount("10.00")
/// );
/// ```
#[macro_export]
macro_rules! audit {
    ($event_type:expr, $operation:expr, $request_id:expr) => {
        $crate::security::audit::audit_log(
            &$crate::security::audit::AuditEvent::new($event_type, $operation, $request_id)
        )
    };
    ($event_type:expr, $operation:expr, $request_id:expr, $($method:ident($arg:expr)),+ $(,)?) => {
        $crate::security::audit::audit_log(
            &$crate::security::audit::AuditEvent::new($event_type, $operation, $request_id)
                $(.$method($arg))+
        )
    };
}
