//! Messaging Sink
//!
//! Renders and sends the payment-confirmation email over an authenticated
//! SMTP relay. One pooled transport is built at startup and lives for the
//! process; no state leaks between sends. Delivery failure must not block
//! payment acknowledgment or the ledger append.

use std::sync::RwLock;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use eventpay_core::PaymentRecord;

use crate::error::{Result, SinkError};

/// Outbound confirmation mail sender.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Render and send one confirmation for this record.
    async fn send(&self, record: &PaymentRecord) -> Result<()>;

    /// Sink name for logs
    fn name(&self) -> &str;
}

/// Subject line for a confirmation mail.
#[must_use]
pub fn subject(record: &PaymentRecord) -> String {
    format!("New Payment for {}", record.event_name)
}

/// HTML body for a confirmation mail.
#[must_use]
pub fn body_html(record: &PaymentRecord) -> String {
    let items = record
        .items
        .iter()
        .map(|item| {
            format!(
                "<p>{} - {}{} x {}</p>",
                item.name, record.currency, item.price, item.quantity
            )
        })
        .collect::<String>();

    format!(
        "<h2>Payment Confirmation</h2>\
         <p><strong>Event:</strong> {}</p>\
         <p><strong>Name:</strong> {}</p>\
         <p><strong>Email:</strong> {}</p>\
         <p><strong>Items Purchased:</strong></p>\
         {}\
         <p><strong>Total Paid:</strong> {} {}</p>",
        record.event_name,
        record.customer_name,
        record.customer_email,
        items,
        record.amount_display(),
        record.currency,
    )
}

/// SMTP-backed mailer
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    operator_bcc: Option<Mailbox>,
}

impl SmtpMailer {
    /// Create from environment variables.
    ///
    /// `SMTP_HOST`, `SMTP_USER` and `SMTP_PASS` are required; `SMTP_PORT`
    /// defaults to 587 (STARTTLS), `SMTP_FROM` to the relay user, and the
    /// operator copy goes to `OPERATOR_EMAIL` (also defaulting to the relay
    /// user).
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("SMTP_HOST")
            .map_err(|_| SinkError::Config("SMTP_HOST not set".into()))?;
        let port: u16 = std::env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".into())
            .parse()
            .map_err(|_| SinkError::Config("SMTP_PORT is not a port number".into()))?;
        let user = std::env::var("SMTP_USER")
            .map_err(|_| SinkError::Config("SMTP_USER not set".into()))?;
        let pass = std::env::var("SMTP_PASS")
            .map_err(|_| SinkError::Config("SMTP_PASS not set".into()))?;
        let from = std::env::var("SMTP_FROM").unwrap_or_else(|_| user.clone());
        let operator = std::env::var("OPERATOR_EMAIL").unwrap_or_else(|_| user.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)?
            .port(port)
            .credentials(Credentials::new(user, pass))
            .build();

        Ok(Self {
            transport,
            from: from.parse::<Mailbox>()?,
            operator_bcc: Some(operator.parse::<Mailbox>()?),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, record: &PaymentRecord) -> Result<()> {
        let to = record.customer_email.parse::<Mailbox>()?;

        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject(record))
            .header(ContentType::TEXT_HTML);
        if let Some(op) = &self.operator_bcc {
            builder = builder.bcc(op.clone());
        }
        let message = builder.body(body_html(record))?;

        self.transport.send(message).await?;
        tracing::info!(to = %record.customer_email, "Sent payment confirmation mail");
        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}

/// A mail captured by [`MemoryMailer`].
#[derive(Clone, Debug)]
pub struct OutboundMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// In-memory mailer for development and tests.
#[derive(Default)]
pub struct MemoryMailer {
    sent: RwLock<Vec<OutboundMail>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutboundMail> {
        self.sent.read().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, record: &PaymentRecord) -> Result<()> {
        self.sent.write().unwrap().push(OutboundMail {
            to: record.customer_email.clone(),
            subject: subject(record),
            body: body_html(record),
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventpay_core::CartItem;
    use rust_decimal_macros::dec;

    fn sample_record() -> PaymentRecord {
        PaymentRecord {
            customer_name: "Ada Lovelace".into(),
            customer_email: "a@b.com".into(),
            customer_phone: "No Phone Provided".into(),
            event_name: "Gala".into(),
            currency: "GBP".into(),
            amount_paid: PaymentRecord::amount_from_minor_units(4000),
            items: vec![CartItem {
                name: "Ticket".into(),
                price: dec!(20),
                quantity: 2,
            }],
        }
    }

    #[test]
    fn subject_names_the_event() {
        assert_eq!(subject(&sample_record()), "New Payment for Gala");
    }

    #[test]
    fn body_embeds_identity_items_and_total() {
        let html = body_html(&sample_record());

        assert!(html.contains("Payment Confirmation"));
        assert!(html.contains("Ada Lovelace"));
        assert!(html.contains("a@b.com"));
        assert!(html.contains("Ticket - GBP20 x 2"));
        assert!(html.contains("40.00 GBP"));
    }

    #[test]
    fn body_with_empty_cart_still_renders() {
        let record = PaymentRecord {
            items: Vec::new(),
            ..sample_record()
        };
        let html = body_html(&record);
        assert!(html.contains("Total Paid"));
    }

    #[tokio::test]
    async fn memory_mailer_captures_rendered_mail() {
        let mailer = MemoryMailer::new();
        mailer.send(&sample_record()).await.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@b.com");
        assert_eq!(sent[0].subject, "New Payment for Gala");
    }
}
