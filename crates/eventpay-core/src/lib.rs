//! # eventpay-core
//!
//! Shared domain types for the payment confirmation pipeline.
//!
//! The pipeline moves exactly one value between its halves: the
//! [`PaymentRecord`] produced by normalizing a confirmed checkout and
//! consumed once by the notification fan-out. This crate owns that record,
//! the cart line type embedded in checkout metadata, and the money rules
//! both sides must agree on (minor-unit derivation, display formatting).

pub mod record;

pub use record::{CartItem, PaymentRecord};
