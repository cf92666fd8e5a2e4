//! Event Normalization
//!
//! Extracts the canonical [`PaymentRecord`] from a verified
//! `checkout.session.completed` payload. Extraction is
//! defaulting-permissive: every field has a fallback, because a confirmed
//! charge must never be rejected over a missing optional field (a customer
//! declining to give a phone number, an absent cart, and so on).

use eventpay_core::record::{self, CartItem, PaymentRecord};
use serde_json::Value;

use crate::webhook::{PAYMENT_COMPLETED, VerifiedEvent};

/// Per-deployment normalization knobs.
///
/// The source deployments differ only in which optional fields they collect
/// and which currency they fall back to; both are configuration here.
#[derive(Clone, Debug)]
pub struct NormalizeOptions {
    /// Fallback currency code when the payload carries none.
    pub default_currency: String,
    /// Whether this deployment collects customer phone numbers.
    pub collect_phone: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            default_currency: "usd".into(),
            collect_phone: false,
        }
    }
}

impl NormalizeOptions {
    /// Create from environment variables (`DEFAULT_CURRENCY`,
    /// `COLLECT_PHONE`).
    pub fn from_env() -> Self {
        Self {
            default_currency: std::env::var("DEFAULT_CURRENCY")
                .unwrap_or_else(|_| "usd".into()),
            collect_phone: std::env::var("COLLECT_PHONE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

/// Normalize a verified event into a [`PaymentRecord`].
///
/// Returns `None` for any kind other than `checkout.session.completed`:
/// such events are acknowledged upstream and produce no side effects.
pub fn normalize(event: &VerifiedEvent, opts: &NormalizeOptions) -> Option<PaymentRecord> {
    if event.kind != PAYMENT_COMPLETED {
        return None;
    }

    let session = &event.payload;
    let details = session.get("customer_details");
    let metadata = session.get("metadata");

    let customer_name = str_field(details, "name")
        .unwrap_or(record::NO_NAME)
        .to_string();
    let customer_email = str_field(details, "email")
        .unwrap_or(record::NO_EMAIL)
        .to_string();
    let customer_phone = if opts.collect_phone {
        str_field(details, "phone")
            .unwrap_or(record::NO_PHONE)
            .to_string()
    } else {
        record::NO_PHONE.to_string()
    };

    let event_name = str_field(metadata, "eventName")
        .unwrap_or(record::UNKNOWN_EVENT)
        .to_string();

    let currency = session
        .get("currency")
        .and_then(Value::as_str)
        .unwrap_or(&opts.default_currency)
        .to_uppercase();

    // The minor-unit integer is the only source of the amount.
    let amount_total = session
        .get("amount_total")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let amount_paid = PaymentRecord::amount_from_minor_units(amount_total);

    let items = str_field(metadata, "items")
        .map(CartItem::decode_list)
        .unwrap_or_default();

    Some(PaymentRecord {
        customer_name,
        customer_email,
        customer_phone,
        event_name,
        currency,
        amount_paid,
        items,
    })
}

fn str_field<'a>(container: Option<&'a Value>, key: &str) -> Option<&'a str> {
    container?.get(key)?.as_str()
}
