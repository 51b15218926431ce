//! Payment data model.
//!
//! Inputs (amounts, card data, order-level request data) are validated on
//! construction; outputs ([`TransactionResult`]) are immutable.

mod amount;
mod instrument;
mod request;
mod result;

pub use amount::Amount;
pub use instrument::{PaymentForm, PaymentInstrument};
pub use request::{AvsFields, BillingAddress, MAX_ORDER_ID_LEN, TransactionRequest};
pub(crate) use request::validate_order_id;
pub use result::{Outcome, PaymentResponse, ResultDetails, TransactionResult};
