//! Shared fixtures for integration tests.

#![allow(dead_code, reason = "not every test binary uses every fixture")]

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use moneris_gateway::{
    config::{Environment, GatewayConfig},
    error::Result,
    gateway::MonerisGateway,
    models::{Amount, AvsFields, PaymentInstrument, TransactionRequest},
    transport::{ProcessorRequest, RawResponse, SubmitTarget, Transport, TxnType},
};

/// One request as seen by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub txn_type: TxnType,
    pub fields: Vec<(String, String)>,
    pub avs: Option<AvsFields>,
    pub cvd: Option<String>,
    pub endpoint: String,
    pub store_id: String,
    pub api_token: String,
    pub test_mode: bool,
}

impl RecordedCall {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }
}

/// Transport that records submissions and replays queued responses.
///
/// Once the queue is empty every submission gets `Ok(None)`.
#[derive(Debug, Default)]
pub struct MockTransport {
    calls: Mutex<Vec<RecordedCall>>,
    replies: Mutex<VecDeque<Option<RawResponse>>>,
}

impl MockTransport {
    pub fn replying(replies: impl IntoIterator<Item = Option<RawResponse>>) -> Self {
        Self { calls: Mutex::default(), replies: Mutex::new(replies.into_iter().collect()) }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Transport for MockTransport {
    async fn submit<'a>(
        &'a self,
        target: SubmitTarget<'a>,
        request: &'a ProcessorRequest,
    ) -> Result<Option<RawResponse>> {
        self.calls.lock().unwrap().push(RecordedCall {
            txn_type: request.txn_type(),
            fields: request.fields().iter().map(|(n, v)| ((*n).to_owned(), v.clone())).collect(),
            avs: request.avs().cloned(),
            cvd: request.cvd().map(str::to_owned),
            endpoint: target.endpoint.to_owned(),
            store_id: target.credentials.store_id().to_owned(),
            api_token: target.credentials.api_token().to_owned(),
            test_mode: target.test_mode,
        });
        Ok(self.replies.lock().unwrap().pop_front().flatten())
    }

    fn protocol_name(&self) -> &'static str {
        "mock"
    }
}

pub fn staging_config() -> GatewayConfig {
    GatewayConfig::new(Environment::Staging).with_credentials("store5", "yesguy")
}

pub fn gateway(config: GatewayConfig, transport: MockTransport) -> MonerisGateway<MockTransport> {
    MonerisGateway::with_transport(config, transport).expect("config should be valid")
}

pub fn empty_env() -> HashMap<String, String> {
    HashMap::new()
}

pub fn approved(txn_number: &str) -> RawResponse {
    RawResponse {
        receipt_id: Some("ORD-1001".to_owned()),
        response_code: Some("027".to_owned()),
        iso: Some("01".to_owned()),
        auth_code: Some("530114".to_owned()),
        message: Some("APPROVED           *                    =".to_owned()),
        txn_number: Some(txn_number.to_owned()),
        card_type: Some("V".to_owned()),
        trans_date: Some("2026-10-19".to_owned()),
        trans_time: Some("14:02:11".to_owned()),
        complete: Some("true".to_owned()),
        ..RawResponse::default()
    }
}

pub fn declined(code: &str, iso: &str) -> RawResponse {
    RawResponse {
        receipt_id: Some("ORD-1001".to_owned()),
        response_code: Some(code.to_owned()),
        iso: Some(iso.to_owned()),
        message: Some("DECLINED           *                    =".to_owned()),
        txn_number: Some("660110910011139741".to_owned()),
        complete: Some("true".to_owned()),
        ..RawResponse::default()
    }
}

pub fn order() -> TransactionRequest {
    TransactionRequest::new("ORD-1001", Amount::from_minor_units(2599).unwrap()).unwrap()
}

pub fn visa(cvd: Option<&str>) -> PaymentInstrument {
    PaymentInstrument::new("4242424242424242", "1228", cvd).unwrap()
}
