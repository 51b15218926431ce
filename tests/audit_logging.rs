//! Log output tests: audit events are emitted and secrets never appear.

mod common;

use std::{
    io,
    sync::{Arc, Mutex},
};

use common::{MockTransport, approved, gateway, order, staging_config, visa};
use moneris_gateway::{gateway::PaymentGateway, models::Amount};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs() -> (Captured, tracing::subscriber::DefaultGuard) {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    (captured, tracing::subscriber::set_default(subscriber))
}

#[tokio::test]
async fn test_purchase_logs_audit_trail_without_secrets() {
    let (logs, _guard) = capture_logs();
    let gateway = gateway(staging_config(), MockTransport::replying([Some(approved("TXN-1"))]));

    let result = gateway.purchase(&order(), visa(Some("987"))).await.unwrap();
    assert!(result.is_successful());

    let output = logs.contents();
    assert!(output.contains("audit"), "audit target present");
    assert!(output.contains("TransactionAttempted"));
    assert!(output.contains("TransactionApproved"));
    assert!(output.contains("****4242"));
    assert!(output.contains("ORD-1001"));
    assert!(!output.contains("4242424242424242"), "card number leaked");
    assert!(!output.contains("yesguy"), "api token leaked");
}

#[tokio::test]
async fn test_rejected_operation_is_audited() {
    let (logs, _guard) = capture_logs();
    let gateway = gateway(staging_config(), MockTransport::default());

    let amount = Amount::from_minor_units(100).unwrap();
    assert!(gateway.capture(" ", amount, "ORD-1001").await.is_err());

    let output = logs.contents();
    assert!(output.contains("TransactionRejected"));
    assert!(output.contains("operation rejected before submission"));
    assert_eq!(gateway.transport().call_count(), 0);
}

#[tokio::test]
async fn test_unsupported_operation_is_audited() {
    let (logs, _guard) = capture_logs();
    let gateway = gateway(staging_config(), MockTransport::default());

    assert!(gateway.complete_authorize("REF").is_err());
    assert!(logs.contents().contains("OperationNotSupported"));
}
