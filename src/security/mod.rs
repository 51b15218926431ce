//! Security controls for payment operations.
//!
//! # Audit Logging
//!
//! Structured audit events go to the `audit` tracing target so they can be
//! routed to a separate sink:
//!
//! ```rust
//! use moneris_gateway::{
//!     gateway::Operation,
//!     security::audit::{AuditEvent, AuditEventType},
//! };
//! use uuid::Uuid;
//!
//! let event = AuditEvent::new(AuditEventType::TransactionApproved, Operation::Purchase, Uuid::new_v4())
//!     .with_order_id("ORD-1001")
//!     .with_reference("660110910011139740");
//!
//! moneris_gateway::security::audit::audit_log(&event);
//! ```
//!
//! # Card Data
//!
//! - Card numbers, expiry dates and security codes are never logged
//! - [`PaymentInstrument`](crate::models::PaymentInstrument) and request buffers are zeroized on drop
//! - Free text headed for logs goes through [`redact_card_numbers`]

pub mod audit;

pub use audit::{AuditDetails, AuditEvent, AuditEventType, audit_log, redact_card_numbers};
