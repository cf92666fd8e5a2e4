//! Payment Domain Records
//!
//! The cart a customer checks out with and the normalized record produced
//! from a confirmed payment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fallback when the processor reports no customer name.
pub const NO_NAME: &str = "No Name Provided";

/// Fallback when the processor reports no customer email.
pub const NO_EMAIL: &str = "No Email Provided";

/// Fallback when the customer declines to share a phone number.
pub const NO_PHONE: &str = "No Phone Provided";

/// Fallback when the checkout metadata carries no event name.
pub const UNKNOWN_EVENT: &str = "Unknown Event";

/// A single line in the customer's cart.
///
/// Carried through checkout as serialized session metadata and recovered
/// verbatim from the confirmation webhook, so the pipeline never needs a
/// session store of its own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub name: String,
    /// Major-unit price as entered by the frontend.
    pub price: Decimal,
    pub quantity: u32,
}

impl CartItem {
    /// Decode a serialized cart from checkout metadata.
    ///
    /// Total: a malformed list yields an empty cart rather than an error.
    /// A broken item list must not block confirmation of a successful
    /// charge.
    pub fn decode_list(raw: &str) -> Vec<CartItem> {
        match serde_json::from_str(raw) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed cart metadata, treating as empty");
                Vec::new()
            }
        }
    }
}

/// Canonical result of a confirmed payment.
///
/// Transient value: produced by the normalizer, handed to the fan-out,
/// consumed exactly once, never persisted by the pipeline itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub event_name: String,
    /// Upper-cased 3-letter code.
    pub currency: String,
    /// Major-unit amount, always derived from the processor's minor-unit
    /// integer. Never parsed from a display string.
    pub amount_paid: Decimal,
    /// Cart contents in original order. Ordering is significant only for
    /// display, not for computation.
    pub items: Vec<CartItem>,
}

impl PaymentRecord {
    /// Convert a minor-unit amount (cents, pence) to the major unit.
    ///
    /// Negative inputs clamp to zero; a record never carries a negative
    /// amount.
    #[must_use]
    pub fn amount_from_minor_units(minor: i64) -> Decimal {
        Decimal::new(minor.max(0), 2)
    }

    /// Amount formatted to two decimal places for mail and the ledger.
    #[must_use]
    pub fn amount_display(&self) -> String {
        format!("{:.2}", self.amount_paid)
    }

    /// One line per item: `<name> - <CUR><price> x <qty>`.
    #[must_use]
    pub fn items_summary(&self) -> String {
        self.items
            .iter()
            .map(|item| {
                format!(
                    "{} - {}{} x {}",
                    item.name, self.currency, item.price, item.quantity
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
