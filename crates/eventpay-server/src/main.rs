//! eventpay HTTP Server
//!
//! Axum host for the payment confirmation pipeline: hosted checkout
//! creation, the processor webhook, and the notification fan-out to the
//! payment ledger and the confirmation mailer.
//!
//! Every collaborator is optional at startup: an unconfigured Stripe key,
//! relay, or ledger downgrades that surface with a warning instead of
//! refusing to boot.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eventpay_notify::{AirtableLedger, Dispatcher, LedgerSink, Mailer, SmtpMailer};
use eventpay_payments::{
    MemoryProcessedEventStore, NormalizeOptions, StripeClient, WebhookVerifier,
};

use crate::handlers::{
    create_checkout_session, get_checkout_session, get_config, health_check, payment_webhook,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Checkout initiator
    let stripe = match StripeClient::from_env() {
        Ok(client) => {
            tracing::info!("✓ Stripe checkout configured");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!("⚠ Stripe checkout disabled: {e}");
            None
        }
    };

    // Webhook verifier
    let verifier = match WebhookVerifier::from_env() {
        Ok(v) => {
            tracing::info!("✓ Webhook verification configured");
            Some(Arc::new(v))
        }
        Err(e) => {
            tracing::warn!("⚠ Webhook intake disabled: {e}");
            None
        }
    };

    // Sinks are wired per deployment configuration
    let ledger: Option<Arc<dyn LedgerSink>> = match AirtableLedger::from_env() {
        Ok(l) => {
            tracing::info!("✓ Ledger sink active");
            Some(Arc::new(l))
        }
        Err(e) => {
            tracing::warn!("⚠ Ledger sink disabled: {e}");
            None
        }
    };
    let mailer: Option<Arc<dyn Mailer>> = match SmtpMailer::from_env() {
        Ok(m) => {
            tracing::info!("✓ Messaging sink active");
            Some(Arc::new(m))
        }
        Err(e) => {
            tracing::warn!("⚠ Messaging sink disabled: {e}");
            None
        }
    };

    let dispatcher = Arc::new(Dispatcher::new(ledger, mailer));
    if !dispatcher.has_sinks() {
        tracing::warn!("⚠ No sinks configured - confirmed payments will only be logged");
    }

    let state = AppState {
        stripe,
        verifier,
        normalize: NormalizeOptions::from_env(),
        processed: Arc::new(MemoryProcessedEventStore::new()),
        dispatcher,
    };

    // CORS: restricted to the configured frontend origin when set
    let cors = match std::env::var("FRONTEND_URL") {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            tracing::warn!("⚠ FRONTEND_URL not set - CORS allows any origin");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/config", get(get_config))
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/checkout-session", get(get_checkout_session))
        .route("/webhook", post(payment_webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🚀 eventpay server running on http://{addr}");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                  - Health check");
    tracing::info!("  GET  /config                  - Publishable key");
    tracing::info!("  POST /create-checkout-session - Create hosted checkout");
    tracing::info!("  GET  /checkout-session        - Retrieve session by id");
    tracing::info!("  POST /webhook                 - Payment processor webhook");

    axum::serve(listener, app).await?;

    Ok(())
}
