//! Moneris Payment Gateway Client
//!
//! A card payment client for the Moneris eSELECTplus XML API, meant to be
//! embedded in a host order workflow.
//!
//! # Overview
//!
//! The crate covers four card operations and reduces every processor reply
//! to one canonical result shape:
//!
//! - `authorize`: reserve funds (`preauth`)
//! - `capture`: collect reserved funds (`completion`)
//! - `purchase`: authorize and capture in one step
//! - `refund`: return funds from a prior purchase or capture
//!
//! Each operation is submitted exactly once. Configuration and input problems
//! fail with an error before any I/O; once a request is sent, the caller always
//! gets a [`TransactionResult`](models::TransactionResult), including for
//! timeouts and unreadable replies.
//!
//! Credentials are resolved from the settings or the environment on every
//! call. Card data is wiped from memory once the request is built, and audit
//! events are emitted on the `audit` tracing target with card numbers masked.
//!
//! # Examples
//!
//! ```no_run
//! use moneris_gateway::{
//!     config::GatewayConfig,
//!     gateway::{MonerisGateway, PaymentGateway},
//!     models::{Amount, PaymentInstrument, TransactionRequest},
//! };
//!
//! # async fn example() -> moneris_gateway::error::Result<()> {
//! let config = GatewayConfig::from_toml(r#"
//!     environment = "staging"
//!     enable_avs = true
//!     store_id = "$MONERIS_STORE_ID"
//!     api_token = "$MONERIS_API_TOKEN"
//! "#)?;
//! let gateway = MonerisGateway::new(config)?;
//!
//! let request = TransactionRequest::new("ORD-1001", Amount::from_minor_units(2599)?)?
//!     .with_customer_id("buyer@example.com");
//! let card = PaymentInstrument::new("4242424242424242", "1228", Some("123"))?;
//!
//! let authorized = gateway.authorize(&request, card).await?;
//! if authorized.is_successful() {
//!     let captured = gateway
//!         .capture(authorized.reference(), request.amount(), request.order_id())
//!         .await?;
//!     println!("{}: {}", captured.code(), captured.message());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and quick-xml"
)]

pub mod config;
pub mod error;
pub mod gateway;
pub mod history;
pub mod models;
pub mod security;
pub mod transport;

pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use gateway::{MonerisGateway, Operation, PaymentGateway};
pub use models::{Amount, Outcome, PaymentInstrument, TransactionRequest, TransactionResult};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _error_type: std::marker::PhantomData<GatewayError> = std::marker::PhantomData;
        let _gateway_type: std::marker::PhantomData<MonerisGateway> = std::marker::PhantomData;
        assert!(GatewayConfig::default().is_test_mode());
    }
}
