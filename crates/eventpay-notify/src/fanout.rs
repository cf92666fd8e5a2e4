//! Notification Fan-out
//!
//! Dispatches a normalized record to the active sinks concurrently. The two
//! side effects are independent: one failing must not prevent or roll back
//! the other, and neither outcome reaches the webhook response. Sinks
//! return plain `Result`s; the catch-log-continue policy lives here and
//! only here.

use std::sync::Arc;

use eventpay_core::PaymentRecord;

use crate::ledger::LedgerSink;
use crate::mailer::Mailer;

/// Outcome of one sink during a dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkStatus {
    /// Sink ran and succeeded.
    Completed,
    /// Sink ran and failed; the error was logged and swallowed.
    Failed,
    /// Sink is not wired in this deployment.
    Skipped,
}

/// Per-dispatch summary for logs and tests. Never an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchReport {
    pub ledger: SinkStatus,
    pub mail: SinkStatus,
}

/// Fan-out over the configured sinks.
///
/// Which sinks are active is deployment configuration, not code: either
/// slot may be empty.
pub struct Dispatcher {
    ledger: Option<Arc<dyn LedgerSink>>,
    mailer: Option<Arc<dyn Mailer>>,
}

impl Dispatcher {
    pub fn new(ledger: Option<Arc<dyn LedgerSink>>, mailer: Option<Arc<dyn Mailer>>) -> Self {
        Self { ledger, mailer }
    }

    pub fn ledger_active(&self) -> bool {
        self.ledger.is_some()
    }

    pub fn mailer_active(&self) -> bool {
        self.mailer.is_some()
    }

    /// True if at least one sink is wired.
    pub fn has_sinks(&self) -> bool {
        self.ledger_active() || self.mailer_active()
    }

    /// Dispatch a record to all active sinks concurrently.
    ///
    /// Infallible by contract: each sink's error is caught at its own
    /// boundary and logged. Both sinks get their own copy of the record
    /// and both are awaited before this returns.
    pub async fn dispatch(&self, record: PaymentRecord) -> DispatchReport {
        let ledger_record = record.clone();
        let mail_record = record;

        let ledger_task = async {
            match &self.ledger {
                None => SinkStatus::Skipped,
                Some(sink) => match sink.append(&ledger_record).await {
                    Ok(()) => SinkStatus::Completed,
                    Err(e) => {
                        tracing::error!(sink = sink.name(), error = %e, "Ledger sink failed");
                        SinkStatus::Failed
                    }
                },
            }
        };

        let mail_task = async {
            match &self.mailer {
                None => SinkStatus::Skipped,
                Some(sink) => match sink.send(&mail_record).await {
                    Ok(()) => SinkStatus::Completed,
                    Err(e) => {
                        tracing::error!(sink = sink.name(), error = %e, "Messaging sink failed");
                        SinkStatus::Failed
                    }
                },
            }
        };

        let (ledger, mail) = tokio::join!(ledger_task, mail_task);
        DispatchReport { ledger, mail }
    }
}
