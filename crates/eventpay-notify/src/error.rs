//! Sink Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, SinkError>;

/// Errors from the downstream sinks.
///
/// Sinks report failures; what to do with them is the fan-out's decision.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Ledger request never completed
    #[error("ledger request failed: {0}")]
    LedgerTransport(#[from] reqwest::Error),

    /// Ledger answered with a non-success status
    #[error("ledger rejected row (status {status}): {body}")]
    LedgerRejected { status: u16, body: String },

    /// Mail message could not be built
    #[error("mail message invalid: {0}")]
    MailBuild(#[from] lettre::error::Error),

    /// Recipient or sender address is not a mailbox
    #[error("mail address invalid: {0}")]
    MailAddress(#[from] lettre::address::AddressError),

    /// SMTP relay refused or failed the send
    #[error("mail relay failed: {0}")]
    MailTransport(#[from] lettre::transport::smtp::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}
