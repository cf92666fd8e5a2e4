//! Application State

use std::sync::Arc;

use eventpay_notify::Dispatcher;
use eventpay_payments::{NormalizeOptions, ProcessedEventStore, StripeClient, WebhookVerifier};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Stripe client (None when checkout is not configured)
    pub stripe: Option<Arc<StripeClient>>,

    /// Webhook verifier (None when no signing secret is configured)
    pub verifier: Option<Arc<WebhookVerifier>>,

    /// Normalization knobs for this deployment
    pub normalize: NormalizeOptions,

    /// Seen-event store for idempotent webhook handling
    pub processed: Arc<dyn ProcessedEventStore>,

    /// Fan-out over the active sinks
    pub dispatcher: Arc<Dispatcher>,
}
