//! Payment Error Types

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors from the processor-facing pipeline half.
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Stripe API error
    #[error("Stripe error: {0}")]
    Stripe(String),

    /// Signature header could not be parsed
    #[error("Invalid signature header: {0}")]
    SignatureHeader(String),

    /// Signature did not match the raw body
    #[error("Webhook signature mismatch")]
    SignatureInvalid,

    /// Event timestamp outside the replay window
    #[error("Webhook timestamp outside tolerance")]
    TimestampOutOfRange,

    /// JSON encode/decode failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Price cannot be expressed in the processor's integer minor units
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(Decimal),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
