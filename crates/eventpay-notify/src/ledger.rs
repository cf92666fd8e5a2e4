//! Ledger Sink
//!
//! Appends one row per confirmed payment to an external tabular store
//! (Airtable). Append-only: no update or delete call is ever made, and a
//! ledger outage must not block payment acknowledgment or mail delivery.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};

use eventpay_core::PaymentRecord;

use crate::error::{Result, SinkError};

/// Append-only ledger of confirmed payments.
#[async_trait]
pub trait LedgerSink: Send + Sync {
    /// Append exactly one row for this record.
    async fn append(&self, record: &PaymentRecord) -> Result<()>;

    /// Sink name for logs
    fn name(&self) -> &str;
}

/// Map a record onto the ledger's fixed column set.
///
/// The timestamp is server-assigned at append time.
#[must_use]
pub fn row_fields(record: &PaymentRecord) -> Value {
    json!({
        "Timestamp": Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        "Customer Name": &record.customer_name,
        "Customer Email": &record.customer_email,
        "Phone Number": &record.customer_phone,
        "Event Name": &record.event_name,
        "Amount Paid": record.amount_display(),
        "Items Purchased": record.items_summary(),
        "Currency": &record.currency,
    })
}

/// Airtable-backed ledger
pub struct AirtableLedger {
    http: reqwest::Client,
    api_key: String,
    base_id: String,
    table: String,
}

impl AirtableLedger {
    pub fn new(
        api_key: impl Into<String>,
        base_id: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_id: base_id.into(),
            table: table.into(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("AIRTABLE_API_KEY")
            .map_err(|_| SinkError::Config("AIRTABLE_API_KEY not set".into()))?;
        let base_id = std::env::var("AIRTABLE_BASE_ID")
            .map_err(|_| SinkError::Config("AIRTABLE_BASE_ID not set".into()))?;
        let table = std::env::var("AIRTABLE_TABLE").unwrap_or_else(|_| "Payments".into());

        Ok(Self::new(api_key, base_id, table))
    }

    fn endpoint(&self) -> String {
        format!("https://api.airtable.com/v0/{}/{}", self.base_id, self.table)
    }
}

#[async_trait]
impl LedgerSink for AirtableLedger {
    async fn append(&self, record: &PaymentRecord) -> Result<()> {
        let body = json!({ "records": [{ "fields": row_fields(record) }] });

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::LedgerRejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        tracing::info!(table = %self.table, "Appended payment row to ledger");
        Ok(())
    }

    fn name(&self) -> &str {
        "airtable"
    }
}

/// In-memory ledger for development and tests.
#[derive(Default)]
pub struct MemoryLedger {
    rows: RwLock<Vec<Value>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<Value> {
        self.rows.read().unwrap().clone()
    }
}

#[async_trait]
impl LedgerSink for MemoryLedger {
    async fn append(&self, record: &PaymentRecord) -> Result<()> {
        self.rows.write().unwrap().push(row_fields(record));
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
