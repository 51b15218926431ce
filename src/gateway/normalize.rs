//! Response normalization.

use crate::{
    config::ApprovalCodes,
    models::{Outcome, ResultDetails, TransactionResult},
    transport::RawResponse,
};

/// Message for an absent or unparseable response.
pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid response from payment gateway";

/// Message for a timed-out transaction that carries no processor message.
pub const TIMED_OUT_MESSAGE: &str = "Transaction timed out";

/// Last-resort message when nothing else identifies the failure.
pub const UNPROCESSED_MESSAGE: &str = "Could not process transaction";

/// Turns a transport reply into a canonical result.
///
/// - No response: failure, [`INVALID_RESPONSE_MESSAGE`], unknown outcome
/// - Approved when the response code is in `approval_codes`
/// - Reference is the transaction number, else the receipt id
/// - Message is the processor's, else the first of: timeout, ISO code,
///   response code, [`UNPROCESSED_MESSAGE`]
///
/// A non-approval that timed out or carries no response code has an unknown
/// outcome. Every other non-approval is a decline.
///
/// # Examples
///
/// ```
/// use moneris_gateway::{
///     config::ApprovalCodes,
///     gateway::normalize_response,
///     models::Outcome,
///     transport::RawResponse,
/// };
///
/// let raw = RawResponse {
///     response_code: Some("476".to_owned()),
///     iso: Some("48".to_owned()),
///     ..RawResponse::default()
/// };
/// let result = normalize_response(Some(&raw), &ApprovalCodes::default());
///
/// assert!(!result.is_successful());
/// assert_eq!(result.message(), "ISO Error Code: 48");
/// assert_eq!(result.outcome(), Outcome::Declined);
/// ```
#[must_use]
pub fn normalize_response(
    raw: Option<&RawResponse>,
    approval_codes: &ApprovalCodes,
) -> TransactionResult {
    let Some(raw) = raw else {
        return TransactionResult::new(
            Outcome::Unknown,
            String::new(),
            INVALID_RESPONSE_MESSAGE.to_owned(),
            String::new(),
            ResultDetails::default(),
        );
    };

    let code = non_empty(raw.response_code.as_deref()).unwrap_or_default().to_owned();
    let approved = !code.is_empty() && approval_codes.contains(&code);

    let outcome = if approved {
        Outcome::Approved
    } else if raw.timed_out || code.is_empty() {
        Outcome::Unknown
    } else {
        Outcome::Declined
    };

    let reference = non_empty(raw.txn_number.as_deref())
        .or_else(|| non_empty(raw.receipt_id.as_deref()))
        .unwrap_or_default()
        .to_owned();

    TransactionResult::new(outcome, code, resolve_message(raw), reference, details(raw))
}

fn resolve_message(raw: &RawResponse) -> String {
    if let Some(message) = non_empty(raw.message.as_deref()) {
        return message.to_owned();
    }
    if raw.timed_out {
        return TIMED_OUT_MESSAGE.to_owned();
    }
    if let Some(iso) = non_empty(raw.iso.as_deref()) {
        return format!("ISO Error Code: {iso}");
    }
    if let Some(code) = non_empty(raw.response_code.as_deref()) {
        return format!("Response code: {code}");
    }
    UNPROCESSED_MESSAGE.to_owned()
}

fn details(raw: &RawResponse) -> ResultDetails {
    let field = |value: &Option<String>| non_empty(value.as_deref()).unwrap_or_default().to_owned();

    ResultDetails {
        receipt_id: field(&raw.receipt_id),
        iso_code: field(&raw.iso),
        auth_code: field(&raw.auth_code),
        card_type: field(&raw.card_type),
        trans_date: field(&raw.trans_date),
        trans_time: field(&raw.trans_time),
        avs_result_code: field(&raw.avs_result_code),
        cvd_result_code: field(&raw.cvd_result_code),
    }
}

/// Trims, and treats empty values and a literal `null` as absent.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
}
