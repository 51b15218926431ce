//! Processor request construction.
//!
//! Field order follows the processor's transaction templates.

use crate::{
    config::GatewayConfig,
    error::{GatewayError, Result},
    models::{Amount, AvsFields, PaymentInstrument, TransactionRequest, validate_order_id},
    transport::{ProcessorRequest, TxnType},
};

/// Builds a `preauth` or `purchase` request.
///
/// `cust_id` is only sent when known. AVS fields are attached whenever AVS is
/// enabled, empty or not. The security code is attached whenever present and
/// required when CVD is enabled.
pub(crate) fn card_request(
    txn_type: TxnType,
    request: &TransactionRequest,
    instrument: &PaymentInstrument,
    config: &GatewayConfig,
) -> Result<ProcessorRequest> {
    if config.enable_cvd && instrument.security_code().is_none() {
        return Err(GatewayError::InvalidInput(
            "security code is required when CVD is enabled".to_owned(),
        ));
    }

    let mut built = ProcessorRequest::new(txn_type).with_field("order_id", request.order_id());
    if let Some(customer_id) = request.customer_id() {
        built = built.with_field("cust_id", customer_id);
    }
    built = built
        .with_field("amount", request.amount().to_processor_string())
        .with_field("pan", instrument.number())
        .with_field("expdate", instrument.processor_expiry())
        .with_field("crypt_type", request.crypt_type().unwrap_or(&config.crypt_type));

    if config.enable_avs {
        built = built.with_avs(AvsFields::from_address(request.billing_address()));
    }
    if let Some(code) = instrument.security_code() {
        built = built.with_cvd(code);
    }

    Ok(built)
}

/// Builds a `completion` request for a capture.
pub(crate) fn completion_request(
    reference: &str,
    amount: Amount,
    order_id: &str,
) -> Result<ProcessorRequest> {
    let reference = require_reference(reference, "capture")?;
    let order_id = validate_order_id(order_id.to_owned())?;

    Ok(ProcessorRequest::new(TxnType::Completion)
        .with_field("order_id", order_id)
        .with_field("comp_amount", amount.to_processor_string())
        .with_field("txn_number", reference))
}

/// Builds a `refund` request.
pub(crate) fn refund_request(
    reference: &str,
    amount: Amount,
    order_id: &str,
    config: &GatewayConfig,
) -> Result<ProcessorRequest> {
    let reference = require_reference(reference, "refund")?;
    let order_id = validate_order_id(order_id.to_owned())?;

    Ok(ProcessorRequest::new(TxnType::Refund)
        .with_field("order_id", order_id)
        .with_field("amount", amount.to_processor_string())
        .with_field("txn_number", reference)
        .with_field("crypt_type", config.crypt_type.as_str()))
}

fn require_reference<'a>(reference: &'a str, operation: &str) -> Result<&'a str> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(GatewayError::MissingReference(format!(
            "{operation} requires the reference of a prior successful transaction"
        )));
    }
    Ok(reference)
}
