//! Transport abstraction for the processor's HTTPS API.
//!
//! The gateway composes a [`ProcessorRequest`] and hands it to a [`Transport`],
//! which owns everything about the wire: envelope encoding, the HTTPS call
//! and receipt decoding. The gateway only sees the decoded [`RawResponse`].
//!
//! # Result contract
//!
//! | Situation | Return value |
//! |-----------|--------------|
//! | Receipt decoded | `Ok(Some(response))` |
//! | Body absent, non-2xx or unparseable | `Ok(None)` |
//! | Timed out after the request was sent | `Ok(Some(RawResponse::timeout()))` |
//! | Request never left the process | `Err(..)` |
//!
//! # Examples
//!
//! ```rust,no_run
//! use moneris_gateway::{
//!     config::ResolvedCredentials,
//!     transport::{HttpTransport, ProcessorRequest, SubmitTarget, Transport, TxnType},
//! };
//!
//! # async fn example() -> moneris_gateway::error::Result<()> {
//! let transport = HttpTransport::new()?;
//! let credentials = ResolvedCredentials::new("store5", "yesguy")?;
//! let target = SubmitTarget {
//!     endpoint: "https://esqa.moneris.com/gateway2/servlet/MpgRequest",
//!     credentials: &credentials,
//!     test_mode: true,
//! };
//!
//! let request = ProcessorRequest::new(TxnType::Completion)
//!     .with_field("order_id", "ORD-1")
//!     .with_field("comp_amount", "10.00")
//!     .with_field("txn_number", "660110910011139740");
//!
//! if let Some(response) = transport.submit(target, &request).await? {
//!     println!("code: {:?}", response.response_code);
//! }
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;
use std::fmt;

use zeroize::Zeroize;

use crate::{config::ResolvedCredentials, error::Result, models::AvsFields};

pub mod config;
pub mod http;
pub mod xml;

pub use config::{HttpConfig, HttpVersion};
pub use http::HttpTransport;

/// Field names whose values are card data and must never be printed.
const SENSITIVE_FIELDS: &[&str] = &["pan", "expdate"];

/// Where and as whom a request is submitted.
#[derive(Debug, Clone, Copy)]
pub struct SubmitTarget<'a> {
    /// Processor endpoint URL.
    pub endpoint: &'a str,
    /// Store ID and API token resolved for this call.
    pub credentials: &'a ResolvedCredentials,
    /// True when submitting to the QA environment.
    pub test_mode: bool,
}

/// Processor transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnType {
    /// Pre-authorization (authorize).
    Preauth,
    /// Completion of a pre-authorization (capture).
    Completion,
    /// Authorize and capture in one step.
    Purchase,
    /// Refund against a purchase or completion.
    Refund,
}

impl TxnType {
    /// Returns the element name used in the request envelope.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preauth => "preauth",
            Self::Completion => "completion",
            Self::Purchase => "purchase",
            Self::Refund => "refund",
        }
    }
}

impl fmt::Display for TxnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vendor-shaped transaction request.
///
/// Fields keep insertion order, which is the order they are encoded in.
/// Values are wiped on drop and card fields are redacted from `Debug`.
pub struct ProcessorRequest {
    txn_type: TxnType,
    fields: Vec<(&'static str, String)>,
    avs: Option<AvsFields>,
    cvd: Option<String>,
}

impl ProcessorRequest {
    /// Creates an empty request of the given type.
    #[must_use]
    pub const fn new(txn_type: TxnType) -> Self {
        Self { txn_type, fields: Vec::new(), avs: None, cvd: None }
    }

    /// Appends a field.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_field(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((name, value.into()));
        self
    }

    /// Attaches Address Verification fields.
    #[must_use]
    pub fn with_avs(mut self, avs: AvsFields) -> Self {
        self.avs = Some(avs);
        self
    }

    /// Attaches a card security code.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_cvd(mut self, value: impl Into<String>) -> Self {
        self.cvd = Some(value.into());
        self
    }

    /// Transaction type.
    #[must_use]
    pub const fn txn_type(&self) -> TxnType {
        self.txn_type
    }

    /// Returns the value of the first field named `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v.as_str())
    }

    /// All fields in encoding order.
    #[must_use]
    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    /// AVS fields, if attached.
    #[must_use]
    pub const fn avs(&self) -> Option<&AvsFields> {
        self.avs.as_ref()
    }

    /// Card security code, if attached.
    #[must_use]
    pub fn cvd(&self) -> Option<&str> {
        self.cvd.as_deref()
    }
}

impl fmt::Debug for ProcessorRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<(&str, &str)> = self
            .fields
            .iter()
            .map(|(name, value)| {
                let shown = if SENSITIVE_FIELDS.contains(name) { "<redacted>" } else { value.as_str() };
                (*name, shown)
            })
            .collect();

        f.debug_struct("ProcessorRequest")
            .field("txn_type", &self.txn_type)
            .field("fields", &fields)
            .field("avs", &self.avs)
            .field("cvd", &self.cvd.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Drop for ProcessorRequest {
    fn drop(&mut self) {
        for (_, value) in &mut self.fields {
            value.zeroize();
        }
        self.cvd.zeroize();
    }
}

/// Decoded processor receipt.
///
/// Every field is optional; the processor's literal `"null"` and empty
/// elements both decode to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    /// Receipt identifier (echo of the order id).
    pub receipt_id: Option<String>,
    /// Processor reference number.
    pub reference_num: Option<String>,
    /// Processor response code, e.g. `"027"`.
    pub response_code: Option<String>,
    /// Issuer (ISO) response code.
    pub iso: Option<String>,
    /// Authorization code.
    pub auth_code: Option<String>,
    /// Transaction time.
    pub trans_time: Option<String>,
    /// Transaction date.
    pub trans_date: Option<String>,
    /// Processor transaction type code.
    pub trans_type: Option<String>,
    /// Whether the transaction completed (`"true"`/`"false"`).
    pub complete: Option<String>,
    /// Human-readable processor message.
    pub message: Option<String>,
    /// Echoed amount.
    pub trans_amount: Option<String>,
    /// Card brand code.
    pub card_type: Option<String>,
    /// Transaction number used to reference this transaction later.
    pub txn_number: Option<String>,
    /// AVS result code.
    pub avs_result_code: Option<String>,
    /// CVD result code.
    pub cvd_result_code: Option<String>,
    /// True when the processor or the transport reported a timeout.
    pub timed_out: bool,
}

impl RawResponse {
    /// A response standing in for a request that timed out after being sent.
    #[must_use]
    pub fn timeout() -> Self {
        Self { timed_out: true, ..Self::default() }
    }
}

/// Transport protocol abstraction.
///
/// Implementations must be safe for concurrent use; the gateway holds one
/// transport and shares it across calls.
///
/// # Contract
///
/// - Return `Err` only when the request was never sent
/// - Never retry: a resubmitted payment can be charged twice
/// - Never log card fields or the API token
pub trait Transport: Send + Sync {
    /// Submits a request and returns the decoded receipt.
    ///
    /// # Errors
    ///
    /// Returns error if the request could not be encoded or delivered.
    fn submit<'a>(
        &'a self,
        target: SubmitTarget<'a>,
        request: &'a ProcessorRequest,
    ) -> impl Future<Output = Result<Option<RawResponse>>> + Send + 'a;

    /// Returns the protocol name for logging.
    fn protocol_name(&self) -> &'static str;
}
