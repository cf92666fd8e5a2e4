//! # eventpay-payments
//!
//! Processor-facing half of the payment confirmation pipeline.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐    ┌──────────────────┐    ┌──────────────┐
//! │   Checkout   │───▶│  Stripe Hosted   │───▶│   Webhook    │
//! │   Initiator  │    │  Checkout Page   │    │   Delivery   │
//! └──────────────┘    └──────────────────┘    └──────┬───────┘
//!                                                    │
//!                       verify ── normalize ── dedupe┘
//! ```
//!
//! The initiator embeds the cart and event name as opaque session metadata;
//! the processor returns that metadata verbatim inside the completion
//! webhook, so no session state is kept on this side. Inbound deliveries
//! are verified against the raw body, normalized into a
//! [`eventpay_core::PaymentRecord`], and deduplicated by processor event id
//! before any side effect runs.

pub mod checkout;
pub mod dedupe;
pub mod error;
pub mod normalize;
pub mod webhook;

pub use checkout::StripeClient;
pub use dedupe::{MemoryProcessedEventStore, ProcessedEventStore};
pub use error::{PaymentError, Result};
pub use normalize::{NormalizeOptions, normalize};
pub use webhook::{PAYMENT_COMPLETED, VerifiedEvent, WebhookVerifier};
