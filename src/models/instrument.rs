//! Payment card data.
//!
//! All fields are sensitive and must be protected per PCI-DSS requirements:
//! never log card numbers, expiry dates or security codes, and drop the
//! instrument as soon as the request that needs it has been built.

use std::{collections::HashMap, fmt};

use zeroize::Zeroize;

use crate::error::{GatewayError, Result};

/// A validated payment card.
///
/// Created from caller input at authorize/purchase time, immutable once
/// constructed, and wiped from memory on drop. `Debug` shows only the last
/// four digits.
///
/// # Examples
///
/// ```
/// use moneris_gateway::models::PaymentInstrument;
///
/// let card = PaymentInstrument::new("4242424242424242", "1228", Some("123")).unwrap();
/// assert_eq!(card.last_four(), "4242");
/// assert!(!format!("{card:?}").contains("424242424242"));
/// ```
pub struct PaymentInstrument {
    number: String,
    expiry: String,
    security_code: Option<String>,
}

impl PaymentInstrument {
    /// Validates and builds an instrument.
    ///
    /// Rules:
    /// - card number: digits only, 13 to 19 long
    /// - expiry: exactly four digits, `MMYY`, month 01 to 12
    /// - security code: optional, digits only, 3 or 4 long; blank counts as absent
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidInput`] describing the first rule violated.
    pub fn new(number: &str, expiry: &str, security_code: Option<&str>) -> Result<Self> {
        let number = number.trim();
        let expiry = expiry.trim();

        if number.is_empty() {
            return Err(GatewayError::InvalidInput("card number is required".to_owned()));
        }
        if !is_digits(number) {
            return Err(GatewayError::InvalidInput(
                "card number must contain only digits".to_owned(),
            ));
        }
        if !(13..=19).contains(&number.len()) {
            return Err(GatewayError::InvalidInput(
                "card number must be between 13 and 19 digits".to_owned(),
            ));
        }

        if expiry.is_empty() {
            return Err(GatewayError::InvalidInput("expiry is required".to_owned()));
        }
        if expiry.len() != 4 || !is_digits(expiry) {
            return Err(GatewayError::InvalidInput("expiry must be in MMYY format".to_owned()));
        }
        let month = expiry.get(..2).and_then(|m| m.parse::<u8>().ok()).unwrap_or(0);
        if !(1..=12).contains(&month) {
            return Err(GatewayError::InvalidInput("expiry month must be 01-12".to_owned()));
        }

        let security_code = match security_code.map(str::trim) {
            None | Some("") => None,
            Some(code) if !is_digits(code) => {
                return Err(GatewayError::InvalidInput(
                    "security code must contain only digits".to_owned(),
                ));
            }
            Some(code) if !(3..=4).contains(&code.len()) => {
                return Err(GatewayError::InvalidInput(
                    "security code must be 3 or 4 digits".to_owned(),
                ));
            }
            Some(code) => Some(code.to_owned()),
        };

        Ok(Self { number: number.to_owned(), expiry: expiry.to_owned(), security_code })
    }

    /// Card number (PAN).
    #[must_use]
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Expiry in `MMYY` form.
    #[must_use]
    pub fn expiry(&self) -> &str {
        &self.expiry
    }

    /// Expiry in the `YYMM` order the processor expects.
    #[must_use]
    #[allow(clippy::string_slice, reason = "expiry is validated as four ASCII digits")]
    pub fn processor_expiry(&self) -> String {
        format!("{}{}", &self.expiry[2..], &self.expiry[..2])
    }

    /// Card security code, if one was supplied.
    #[must_use]
    pub fn security_code(&self) -> Option<&str> {
        self.security_code.as_deref()
    }

    /// Returns last four digits of the card number for display.
    #[must_use]
    #[allow(clippy::string_slice, reason = "card numbers are ASCII digits")]
    pub fn last_four(&self) -> &str {
        &self.number[self.number.len() - 4..]
    }
}

impl fmt::Debug for PaymentInstrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentInstrument")
            .field("number", &format_args!("****{}", self.last_four()))
            .field("expiry", &"<redacted>")
            .field("security_code", &self.security_code.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Drop for PaymentInstrument {
    fn drop(&mut self) {
        self.number.zeroize();
        self.expiry.zeroize();
        self.security_code.zeroize();
    }
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Raw card form input as submitted by the host checkout page.
///
/// Unvalidated; call [`PaymentForm::validate`] to obtain a [`PaymentInstrument`].
#[derive(Default)]
pub struct PaymentForm {
    /// Card number as typed.
    pub number: String,
    /// Expiry as typed (`MMYY`).
    pub expiry: String,
    /// Security code as typed.
    pub cvd: Option<String>,
}

impl PaymentForm {
    /// Populates a form from loose host field data (`number`, `expiry`, `cvd`).
    ///
    /// Missing fields become empty; validation happens later.
    #[must_use]
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        Self {
            number: fields.get("number").cloned().unwrap_or_default(),
            expiry: fields.get("expiry").cloned().unwrap_or_default(),
            cvd: fields.get("cvd").cloned(),
        }
    }

    /// Validates the form into an instrument, consuming it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidInput`] if any field is invalid.
    pub fn validate(self) -> Result<PaymentInstrument> {
        PaymentInstrument::new(&self.number, &self.expiry, self.cvd.as_deref())
    }
}

impl fmt::Debug for PaymentForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentForm")
            .field("number", &"<redacted>")
            .field("expiry", &"<redacted>")
            .field("cvd", &self.cvd.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Drop for PaymentForm {
    fn drop(&mut self) {
        self.number.zeroize();
        self.expiry.zeroize();
        self.cvd.zeroize();
    }
}
