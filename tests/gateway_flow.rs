//! End-to-end gateway tests over a recording transport.
//!
//! Covers request composition, credential resolution and response
//! normalization for every supported operation.

mod common;

use std::collections::HashMap;

use common::{MockTransport, approved, declined, empty_env, gateway, order, staging_config, visa};
use moneris_gateway::{
    config::{ApprovalCodes, Environment, GatewayConfig},
    error::GatewayError,
    gateway::{
        INVALID_RESPONSE_MESSAGE, Operation, PaymentGateway, TIMED_OUT_MESSAGE, UNPROCESSED_MESSAGE,
    },
    history::{HostTransaction, TransactionKind, TransactionRecord, TransactionStatus},
    models::{Amount, BillingAddress, Outcome, PaymentForm, PaymentResponse},
    transport::{RawResponse, TxnType},
};

fn host_transaction(parent: Option<TransactionRecord>) -> HostTransaction {
    HostTransaction {
        order_number: "ORD-1001".to_owned(),
        customer_email: Some("buyer@example.com".to_owned()),
        payment_amount: Amount::from_minor_units(2599).unwrap(),
        billing_address: Some(BillingAddress::new("123 Main Street", "K1A 0B1")),
        parent,
    }
}

fn purchase_record(id: u64, status: TransactionStatus, reference: &str) -> TransactionRecord {
    TransactionRecord {
        id,
        kind: TransactionKind::Purchase,
        status,
        reference: Some(reference.to_owned()),
        order_number: "ORD-1001".to_owned(),
    }
}

#[tokio::test]
async fn test_authorize_approved() {
    let gateway = gateway(staging_config(), MockTransport::replying([Some(approved("TXN-1"))]));

    let result = gateway.authorize(&order(), visa(None)).await.expect("authorize should run");

    assert!(result.is_successful());
    assert_eq!(result.outcome(), Outcome::Approved);
    assert_eq!(result.code(), "027");
    assert_eq!(result.reference(), "TXN-1");
    assert_eq!(result.details().auth_code, "530114");

    let calls = gateway.transport().calls();
    assert_eq!(calls.len(), 1, "exactly one submission");
    let call = &calls[0];
    assert_eq!(call.txn_type, TxnType::Preauth);
    assert_eq!(call.field("order_id"), Some("ORD-1001"));
    assert_eq!(call.field("amount"), Some("25.99"));
    assert_eq!(call.field("pan"), Some("4242424242424242"));
    assert_eq!(call.field("expdate"), Some("2812"));
    assert_eq!(call.field("crypt_type"), Some("7"));
    assert_eq!(call.store_id, "store5");
    assert_eq!(call.api_token, "yesguy");
    assert!(call.test_mode);
    assert_eq!(call.endpoint, Environment::Staging.endpoint());
}

#[tokio::test]
async fn test_capture_uses_reference_and_order() {
    let gateway = gateway(staging_config(), MockTransport::replying([Some(approved("TXN-2"))]));
    let amount = Amount::from_minor_units(1500).unwrap();

    let result = gateway.capture("TXN-1", amount, "ORD-1001").await.unwrap();
    assert!(result.is_successful());

    let call = &gateway.transport().calls()[0];
    assert_eq!(call.txn_type, TxnType::Completion);
    assert_eq!(call.field("txn_number"), Some("TXN-1"));
    assert_eq!(call.field("comp_amount"), Some("15.00"));
    assert_eq!(call.field("order_id"), Some("ORD-1001"));
    assert!(call.field("pan").is_none());
}

#[tokio::test]
async fn test_purchase_declined() {
    let gateway = gateway(staging_config(), MockTransport::replying([Some(declined("481", "05"))]));

    let result = gateway.purchase(&order(), visa(Some("123"))).await.unwrap();

    assert!(!result.is_successful());
    assert_eq!(result.outcome(), Outcome::Declined);
    assert_eq!(result.code(), "481");
    assert!(result.message().starts_with("DECLINED"));
    assert_eq!(gateway.transport().calls()[0].txn_type, TxnType::Purchase);
    assert_eq!(gateway.transport().calls()[0].cvd.as_deref(), Some("123"));
}

#[tokio::test]
async fn test_refund_request_shape() {
    let gateway = gateway(staging_config(), MockTransport::replying([Some(approved("TXN-9"))]));
    let amount = Amount::from_minor_units(500).unwrap();

    let result = gateway.refund("TXN-1", amount, "ORD-1001").await.unwrap();
    assert!(result.is_successful());

    let call = &gateway.transport().calls()[0];
    assert_eq!(call.txn_type, TxnType::Refund);
    assert_eq!(call.field("txn_number"), Some("TXN-1"));
    assert_eq!(call.field("amount"), Some("5.00"));
    assert_eq!(call.field("crypt_type"), Some("7"));
}

#[tokio::test]
async fn test_missing_credentials_fail_before_io() {
    let transport = MockTransport::replying([Some(approved("TXN-1"))]);
    let gateway = gateway(GatewayConfig::default(), transport).with_env(empty_env());

    let err = gateway.purchase(&order(), visa(None)).await.unwrap_err();

    assert!(err.is_configuration_error());
    assert!(err.to_string().contains("Store ID"));
    assert_eq!(gateway.transport().call_count(), 0);
}

#[tokio::test]
async fn test_credentials_resolved_per_call_from_env() {
    let config = GatewayConfig::default().with_credentials("$STORE", "${TOKEN}");
    let transport = MockTransport::replying([Some(approved("A")), Some(approved("B"))]);

    let env: HashMap<String, String> =
        [("STORE", "store1"), ("TOKEN", "tok1")].map(|(k, v)| (k.to_owned(), v.to_owned())).into();
    let gateway = gateway(config.clone(), transport).with_env(env);
    gateway.capture("REF", Amount::from_minor_units(100).unwrap(), "ORD-1").await.unwrap();
    assert_eq!(gateway.transport().calls()[0].store_id, "store1");

    let rotated: HashMap<String, String> =
        [("STORE", "store2"), ("TOKEN", "tok2")].map(|(k, v)| (k.to_owned(), v.to_owned())).into();
    let gateway = common::gateway(config, MockTransport::replying([Some(approved("C"))]))
        .with_env(rotated);
    gateway.capture("REF", Amount::from_minor_units(100).unwrap(), "ORD-1").await.unwrap();
    assert_eq!(gateway.transport().calls()[0].store_id, "store2");
    assert_eq!(gateway.transport().calls()[0].api_token, "tok2");
}

#[tokio::test]
async fn test_empty_reference_value_fails_before_io() {
    let config = GatewayConfig::default().with_credentials("store5", "$TOKEN");
    let env: HashMap<String, String> = [("TOKEN".to_owned(), String::new())].into();
    let gateway = gateway(config, MockTransport::default()).with_env(env);

    let err = gateway.refund("REF", Amount::ZERO, "ORD-1").await.unwrap_err();
    assert!(matches!(err, GatewayError::ConfigurationError(_)));
    assert_eq!(gateway.transport().call_count(), 0);
}

#[tokio::test]
async fn test_blank_reference_fails_before_io() {
    let gateway = gateway(staging_config(), MockTransport::default());
    let amount = Amount::from_minor_units(100).unwrap();

    let err = gateway.capture("", amount, "ORD-1").await.unwrap_err();
    assert!(matches!(err, GatewayError::MissingReference(_)));

    let err = gateway.refund("   ", amount, "ORD-1").await.unwrap_err();
    assert!(err.is_configuration_error());
    assert_eq!(gateway.transport().call_count(), 0);
}

#[tokio::test]
async fn test_absent_response_is_unknown() {
    let gateway = gateway(staging_config(), MockTransport::replying([None]));

    let result = gateway.purchase(&order(), visa(None)).await.unwrap();

    assert!(!result.is_successful());
    assert_eq!(result.outcome(), Outcome::Unknown);
    assert_eq!(result.message(), INVALID_RESPONSE_MESSAGE);
    assert_eq!(gateway.transport().call_count(), 1, "never retried");
}

#[tokio::test]
async fn test_receipt_without_code_is_unknown() {
    let raw = RawResponse { response_code: Some("null".to_owned()), ..declined("481", "05") };
    let raw = RawResponse { message: None, iso: None, ..raw };
    let gateway = gateway(staging_config(), MockTransport::replying([Some(raw)]));

    let result = gateway.purchase(&order(), visa(None)).await.unwrap();

    assert!(!result.is_successful());
    assert_eq!(result.outcome(), Outcome::Unknown);
    assert_eq!(result.code(), "");
    assert_eq!(result.message(), UNPROCESSED_MESSAGE);
    assert_eq!(result.reference(), "660110910011139741");
    assert_eq!(gateway.transport().call_count(), 1, "never retried");
}

#[tokio::test]
async fn test_timeout_is_unknown_with_message() {
    let gateway = gateway(staging_config(), MockTransport::replying([Some(RawResponse::timeout())]));

    let result = gateway.authorize(&order(), visa(None)).await.unwrap();

    assert!(!result.is_successful());
    assert_eq!(result.outcome(), Outcome::Unknown);
    assert_eq!(result.message(), TIMED_OUT_MESSAGE);
    assert_eq!(gateway.transport().call_count(), 1);
}

#[tokio::test]
async fn test_iso_code_message_when_processor_message_missing() {
    let raw = RawResponse {
        response_code: Some("476".to_owned()),
        iso: Some("12".to_owned()),
        ..RawResponse::default()
    };
    let gateway = gateway(staging_config(), MockTransport::replying([Some(raw)]));

    let result = gateway.purchase(&order(), visa(None)).await.unwrap();
    assert_eq!(result.message(), "ISO Error Code: 12");
    assert_eq!(result.outcome(), Outcome::Declined);
}

#[tokio::test]
async fn test_configured_approval_codes() {
    let config = staging_config().with_approval_codes(ApprovalCodes::new(["005"]));
    let transport = MockTransport::replying([Some(declined("005", "00")), Some(approved("X"))]);
    let gateway = gateway(config, transport);

    assert!(gateway.purchase(&order(), visa(None)).await.unwrap().is_successful());
    assert!(!gateway.purchase(&order(), visa(None)).await.unwrap().is_successful());
}

#[tokio::test]
async fn test_avs_fields_sent_even_when_empty() {
    let config = staging_config().with_avs(true);
    let gateway = gateway(config, MockTransport::replying([Some(approved("A")), Some(approved("B"))]));

    gateway.authorize(&order(), visa(None)).await.unwrap();
    let avs = gateway.transport().calls()[0].avs.clone().expect("avs attached");
    assert_eq!(avs.street_number, "");
    assert_eq!(avs.street_name, "");
    assert_eq!(avs.zip_code, "");

    let request = order().with_billing_address(BillingAddress::new("42 Wallaby Way", "M5V 2T6"));
    gateway.authorize(&request, visa(None)).await.unwrap();
    let avs = gateway.transport().calls()[1].avs.clone().expect("avs attached");
    assert_eq!(avs.street_number, "42");
    assert_eq!(avs.street_name, "Wallaby Way");
    assert_eq!(avs.zip_code, "M5V 2T6");
}

#[tokio::test]
async fn test_cvd_required_when_enabled() {
    let gateway = gateway(staging_config().with_cvd(true), MockTransport::default());

    let err = gateway.purchase(&order(), visa(None)).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidInput(_)));
    assert_eq!(gateway.transport().call_count(), 0);
}

#[tokio::test]
async fn test_production_is_not_test_mode() {
    let config =
        GatewayConfig::new(Environment::Production).with_credentials("store5", "yesguy");
    let gateway = gateway(config, MockTransport::replying([Some(approved("A"))]));

    gateway.purchase(&order(), visa(None)).await.unwrap();
    let call = &gateway.transport().calls()[0];
    assert!(!call.test_mode);
    assert_eq!(call.endpoint, Environment::Production.endpoint());
}

#[tokio::test]
async fn test_result_data_is_stable() {
    let gateway = gateway(staging_config(), MockTransport::replying([Some(approved("TXN-1"))]));
    let result = gateway.purchase(&order(), visa(None)).await.unwrap();

    let first = result.data();
    assert_eq!(first, result.data());
    assert_eq!(first["transaction_number"], "TXN-1");
    assert_eq!(PaymentResponse::transaction_reference(&result), "TXN-1");
    assert!(!result.is_processing());
    assert!(!result.is_redirect());
}

#[tokio::test]
async fn test_unsupported_operations_never_submit() {
    let gateway = gateway(staging_config(), MockTransport::default());

    for operation in Operation::ALL {
        let expected = matches!(
            operation,
            Operation::Authorize
                | Operation::Capture
                | Operation::Purchase
                | Operation::Refund
                | Operation::PartialRefund
        );
        assert_eq!(gateway.supports(operation), expected, "{operation}");
    }

    assert!(gateway.complete_purchase("REF").unwrap_err().is_not_supported());
    assert!(gateway.delete_payment_source("tok").unwrap_err().is_not_supported());
    let err = gateway.process_webhook(b"<xml/>").unwrap_err();
    assert_eq!(err.to_string(), "webhook is not supported by the Moneris gateway");
    assert_eq!(gateway.transport().call_count(), 0);
}

#[tokio::test]
async fn test_refund_transaction_uses_latest_purchase() {
    let gateway = gateway(staging_config(), MockTransport::replying([Some(approved("TXN-R"))]));
    let history = [
        purchase_record(1, TransactionStatus::Success, "TXN-OLD"),
        purchase_record(2, TransactionStatus::Success, "TXN-NEW"),
        purchase_record(3, TransactionStatus::Failed, "TXN-FAILED"),
    ];

    let result = gateway.refund_transaction(&host_transaction(None), &history).await.unwrap();
    assert!(result.is_successful());

    let call = &gateway.transport().calls()[0];
    assert_eq!(call.field("txn_number"), Some("TXN-NEW"));
    assert_eq!(call.field("order_id"), Some("ORD-1001"));
}

#[tokio::test]
async fn test_refund_transaction_without_source_fails_before_io() {
    let gateway = gateway(staging_config(), MockTransport::default());
    let history = [purchase_record(1, TransactionStatus::Failed, "TXN-1")];

    let err = gateway.refund_transaction(&host_transaction(None), &history).await.unwrap_err();
    assert!(matches!(err, GatewayError::MissingReference(_)));
    assert_eq!(gateway.transport().call_count(), 0);
}

#[tokio::test]
async fn test_purchase_transaction_from_form() {
    let gateway = gateway(staging_config(), MockTransport::replying([Some(approved("TXN-1"))]));
    let form = PaymentForm {
        number: "4242424242424242".to_owned(),
        expiry: "1228".to_owned(),
        cvd: Some("123".to_owned()),
    };

    let result = gateway.purchase_transaction(&host_transaction(None), form).await.unwrap();
    assert!(result.is_successful());

    let call = &gateway.transport().calls()[0];
    assert_eq!(call.field("cust_id"), Some("buyer@example.com"));
    assert_eq!(call.field("amount"), Some("25.99"));
}

#[tokio::test]
async fn test_invalid_form_fails_before_io() {
    let gateway = gateway(staging_config(), MockTransport::default());
    let form =
        PaymentForm { number: "1234".to_owned(), expiry: "1228".to_owned(), cvd: None };

    let err = gateway.authorize_transaction(&host_transaction(None), form).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidInput(_)));
    assert_eq!(gateway.transport().call_count(), 0);
}
