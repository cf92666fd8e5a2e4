//! # eventpay-notify
//!
//! Downstream side effects of a confirmed payment: the append-only payment
//! ledger, the confirmation mailer, and the fan-out that dispatches a
//! record to both.
//!
//! The two sinks target disjoint external systems with no shared
//! consistency requirement, so there is no transactional coupling: each
//! returns a plain `Result`, and the [`fanout::Dispatcher`] alone decides
//! that failures are logged and swallowed.

pub mod error;
pub mod fanout;
pub mod ledger;
pub mod mailer;

pub use error::{Result, SinkError};
pub use fanout::{DispatchReport, Dispatcher, SinkStatus};
pub use ledger::{AirtableLedger, LedgerSink, MemoryLedger};
pub use mailer::{Mailer, MemoryMailer, SmtpMailer};
