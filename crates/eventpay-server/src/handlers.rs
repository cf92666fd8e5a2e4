//! HTTP Handlers

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use eventpay_core::CartItem;
use eventpay_payments::normalize;

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub stripe_configured: bool,
    pub ledger_active: bool,
    pub mailer_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub items: Vec<CartItem>,
    #[serde(rename = "eventName", alias = "eventId")]
    pub event_name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    #[serde(rename = "publishableKey")]
    pub publishable_key: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn reject(status: StatusCode, message: impl Into<String>, code: &str) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: code.into(),
        }),
    )
}

fn payments_disabled() -> HandlerError {
    reject(
        StatusCode::SERVICE_UNAVAILABLE,
        "Payments not configured",
        "PAYMENTS_DISABLED",
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        stripe_configured: state.stripe.is_some(),
        ledger_active: state.dispatcher.ledger_active(),
        mailer_active: state.dispatcher.mailer_active(),
    })
}

/// Serve the publishable key the frontend needs to start Stripe.js
pub async fn get_config(
    State(state): State<AppState>,
) -> Result<Json<ConfigResponse>, HandlerError> {
    let stripe = state.stripe.as_ref().ok_or_else(payments_disabled)?;

    Ok(Json(ConfigResponse {
        publishable_key: stripe.publishable_key().to_string(),
    }))
}

/// Create a hosted checkout session for a cart
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, HandlerError> {
    let stripe = state.stripe.as_ref().ok_or_else(payments_disabled)?;

    let session = stripe
        .create_checkout_session(&payload.items, &payload.event_name)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Checkout session creation failed");
            // The upstream error message passes through verbatim.
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.to_string(),
                "CHECKOUT_ERROR",
            )
        })?;

    Ok(Json(CreateSessionResponse {
        id: session.id.to_string(),
    }))
}

/// Retrieve a checkout session; the processor's object is returned verbatim
pub async fn get_checkout_session(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<Value>, HandlerError> {
    let stripe = state.stripe.as_ref().ok_or_else(payments_disabled)?;

    let session = stripe
        .retrieve_checkout_session(&query.session_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Checkout session retrieval failed");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.to_string(),
                "SESSION_ERROR",
            )
        })?;

    let session = serde_json::to_value(&session)
        .map_err(|e| reject(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), "SESSION_ERROR"))?;

    Ok(Json(session))
}

/// Payment processor webhook
///
/// The body stays raw bytes until the signature over them verifies. Only
/// verification and request-shape failures are visible to the sender; sink
/// outcomes never are, because the sender's retry would run both sinks
/// again.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, HandlerError> {
    let verifier = state.verifier.as_ref().ok_or_else(payments_disabled)?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            reject(
                StatusCode::BAD_REQUEST,
                "Missing Stripe signature",
                "MISSING_SIGNATURE",
            )
        })?;

    let event = verifier.verify(&body, signature).map_err(|e| {
        tracing::warn!(error = %e, "Webhook verification failed");
        reject(
            StatusCode::BAD_REQUEST,
            format!("Webhook Error: {e}"),
            "INVALID_SIGNATURE",
        )
    })?;

    // Irrelevant kinds are acknowledged and dropped.
    let Some(record) = normalize(&event, &state.normalize) else {
        tracing::debug!(kind = %event.kind, "Ignoring unhandled event kind");
        return Ok(StatusCode::OK);
    };

    // Replays of an already-dispatched event are acknowledged without
    // re-running the sinks.
    match state.processed.mark(&event.id) {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!(event_id = %event.id, "Duplicate webhook delivery, skipping dispatch");
            return Ok(StatusCode::OK);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Dedup store unavailable, dispatching anyway");
        }
    }

    let report = state.dispatcher.dispatch(record).await;
    tracing::info!(
        event_id = %event.id,
        ledger = ?report.ledger,
        mail = ?report.mail,
        "Payment confirmation dispatched"
    );

    Ok(StatusCode::OK)
}
