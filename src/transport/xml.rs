//! XML envelope codec.
//!
//! Requests are posted as
//! `<request><store_id/><api_token/><{txn_type}>…</{txn_type}></request>` and
//! answered with `<response><receipt>…</receipt></response>`. The codec only
//! wraps and unwraps; per-type field validation is left to the processor.

use serde::{Deserialize, Serialize, ser::SerializeStruct};
use zeroize::Zeroizing;

use super::{ProcessorRequest, RawResponse, TxnType};
use crate::{
    config::ResolvedCredentials,
    error::{GatewayError, Result},
    models::AvsFields,
};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// `<request>` envelope.
#[derive(Serialize)]
struct RequestEnvelope<'a> {
    store_id: &'a str,
    api_token: &'a str,
    #[serde(rename = "$value")]
    transaction: Transaction<'a>,
}

/// Transaction element, named after its type.
#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum Transaction<'a> {
    Preauth(TransactionBody<'a>),
    Completion(TransactionBody<'a>),
    Purchase(TransactionBody<'a>),
    Refund(TransactionBody<'a>),
}

impl<'a> Transaction<'a> {
    const fn new(request: &'a ProcessorRequest) -> Self {
        let body = TransactionBody(request);
        match request.txn_type() {
            TxnType::Preauth => Self::Preauth(body),
            TxnType::Completion => Self::Completion(body),
            TxnType::Purchase => Self::Purchase(body),
            TxnType::Refund => Self::Refund(body),
        }
    }
}

/// Ordered transaction fields followed by the optional verification blocks.
struct TransactionBody<'a>(&'a ProcessorRequest);

impl Serialize for TransactionBody<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let request = self.0;
        let len = request.fields().len()
            + usize::from(request.avs().is_some())
            + usize::from(request.cvd().is_some());

        let mut body = serializer.serialize_struct("transaction", len)?;
        for (name, value) in request.fields() {
            body.serialize_field(*name, value)?;
        }
        if let Some(avs) = request.avs() {
            body.serialize_field("avs_info", &AvsInfo::from(avs))?;
        }
        if let Some(value) = request.cvd() {
            body.serialize_field("cvd_info", &CvdInfo { cvd_indicator: "1", cvd_value: value })?;
        }
        body.end()
    }
}

#[derive(Serialize)]
struct AvsInfo<'a> {
    avs_street_number: &'a str,
    avs_street_name: &'a str,
    avs_zipcode: &'a str,
}

impl<'a> From<&'a AvsFields> for AvsInfo<'a> {
    fn from(avs: &'a AvsFields) -> Self {
        Self {
            avs_street_number: &avs.street_number,
            avs_street_name: &avs.street_name,
            avs_zipcode: &avs.zip_code,
        }
    }
}

#[derive(Serialize)]
struct CvdInfo<'a> {
    cvd_indicator: &'a str,
    cvd_value: &'a str,
}

/// Encodes a request envelope.
///
/// The returned buffer holds card data and credentials and is wiped on drop.
///
/// # Errors
///
/// Returns [`GatewayError::EncodingError`] if serialization fails.
pub fn encode_request(
    credentials: &ResolvedCredentials,
    request: &ProcessorRequest,
) -> Result<Zeroizing<String>> {
    let envelope = RequestEnvelope {
        store_id: credentials.store_id(),
        api_token: credentials.api_token(),
        transaction: Transaction::new(request),
    };

    let content = quick_xml::se::to_string_with_root("request", &envelope)
        .map(Zeroizing::new)
        .map_err(|e| {
            GatewayError::EncodingError(format!("failed to encode {}: {e}", request.txn_type()))
        })?;

    let mut out = Zeroizing::new(String::with_capacity(XML_DECLARATION.len() + content.len()));
    out.push_str(XML_DECLARATION);
    out.push_str(&content);
    Ok(out)
}

#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    receipt: Option<Receipt>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Receipt {
    receipt_id: Option<String>,
    reference_num: Option<String>,
    response_code: Option<String>,
    #[serde(rename = "ISO")]
    iso: Option<String>,
    auth_code: Option<String>,
    trans_time: Option<String>,
    trans_date: Option<String>,
    trans_type: Option<String>,
    complete: Option<String>,
    message: Option<String>,
    trans_amount: Option<String>,
    card_type: Option<String>,
    #[serde(rename = "TransID")]
    trans_id: Option<String>,
    timed_out: Option<String>,
    avs_result_code: Option<String>,
    cvd_result_code: Option<String>,
}

/// Decodes a response body.
///
/// Returns `None` when the body is not XML or carries no `<receipt>`.
#[must_use]
pub fn decode_response(body: &str) -> Option<RawResponse> {
    let envelope: ResponseEnvelope = match quick_xml::de::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::debug!(error = %e, "processor response is not a receipt envelope");
            return None;
        }
    };
    let receipt = envelope.receipt?;

    Some(RawResponse {
        receipt_id: clean(receipt.receipt_id),
        reference_num: clean(receipt.reference_num),
        response_code: clean(receipt.response_code),
        iso: clean(receipt.iso),
        auth_code: clean(receipt.auth_code),
        trans_time: clean(receipt.trans_time),
        trans_date: clean(receipt.trans_date),
        trans_type: clean(receipt.trans_type),
        complete: clean(receipt.complete),
        message: clean(receipt.message),
        trans_amount: clean(receipt.trans_amount),
        card_type: clean(receipt.card_type),
        txn_number: clean(receipt.trans_id),
        avs_result_code: clean(receipt.avs_result_code),
        cvd_result_code: clean(receipt.cvd_result_code),
        timed_out: clean(receipt.timed_out).is_some_and(|v| v.eq_ignore_ascii_case("true")),
    })
}

/// Maps empty values and the processor's literal `null` to `None`.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
}
