//! Stripe Checkout Integration
//!
//! Implements the "Stripe Checkout (Hosted)" approach: the server creates a
//! processor-hosted session and the frontend redirects to it. The cart and
//! event name travel as opaque session metadata that the processor returns
//! verbatim inside the completion webhook, so session state lives entirely
//! on the processor side.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use stripe::{
    CheckoutSession, CheckoutSessionId, CheckoutSessionMode, Client,
    CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionLineItemsPriceData,
    CreateCheckoutSessionLineItemsPriceDataProductData,
    CreateCheckoutSessionPaymentMethodTypes, Currency,
};

use eventpay_core::CartItem;

use crate::error::{PaymentError, Result};

/// Stripe client wrapper
pub struct StripeClient {
    client: Client,
    publishable_key: String,
    currency: Currency,
    frontend_url: String,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(
        secret_key: &str,
        publishable_key: &str,
        currency: Currency,
        frontend_url: &str,
    ) -> Self {
        Self {
            client: Client::new(secret_key),
            publishable_key: publishable_key.to_string(),
            currency,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;
        let publishable_key = std::env::var("STRIPE_PUBLISHABLE_KEY")
            .map_err(|_| PaymentError::Config("STRIPE_PUBLISHABLE_KEY not set".into()))?;
        let currency = parse_currency(
            &std::env::var("CHECKOUT_CURRENCY").unwrap_or_else(|_| "usd".into()),
        )?;
        let frontend_url = std::env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into());

        Ok(Self::new(
            &secret_key,
            &publishable_key,
            currency,
            &frontend_url,
        ))
    }

    /// Key the frontend uses to initialize Stripe.js
    pub fn publishable_key(&self) -> &str {
        &self.publishable_key
    }

    /// Create a one-time-payment checkout session for a cart.
    ///
    /// Each cart line becomes a processor line item priced in integer minor
    /// units; the full cart is also serialized into session metadata for
    /// the webhook normalizer to recover later.
    pub async fn create_checkout_session(
        &self,
        items: &[CartItem],
        event_name: &str,
    ) -> Result<CheckoutSession> {
        let success_url = format!(
            "{}/success.html?session_id={{CHECKOUT_SESSION_ID}}",
            self.frontend_url
        );
        let cancel_url = format!("{}/cancel.html", self.frontend_url);

        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Payment);
        params.payment_method_types = Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]);
        params.success_url = Some(&success_url);
        params.cancel_url = Some(&cancel_url);

        let mut metadata = HashMap::new();
        metadata.insert("eventName".to_string(), event_name.to_string());
        metadata.insert("items".to_string(), serde_json::to_string(items)?);
        params.metadata = Some(metadata);

        let mut line_items = Vec::with_capacity(items.len());
        for item in items {
            line_items.push(CreateCheckoutSessionLineItems {
                quantity: Some(u64::from(item.quantity)),
                price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                    currency: self.currency,
                    unit_amount: Some(to_minor_units(item.price)?),
                    product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                        name: item.name.clone(),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            });
        }
        params.line_items = Some(line_items);

        let session = CheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        tracing::info!(session_id = %session.id, event = event_name, "Created checkout session");
        Ok(session)
    }

    /// Retrieve a session by id; the caller gets the processor's object
    /// verbatim.
    pub async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession> {
        let id = session_id
            .parse::<CheckoutSessionId>()
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        CheckoutSession::retrieve(&self.client, &id, &[])
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))
    }
}

/// Convert a major-unit price to the processor's integer minor units.
///
/// The price arrives straight from the request body, so a value whose
/// minor-unit form overflows is rejected rather than charged as zero.
pub fn to_minor_units(price: Decimal) -> Result<i64> {
    price
        .checked_mul(Decimal::from(100))
        .and_then(|minor| minor.round().to_i64())
        .ok_or(PaymentError::AmountOutOfRange(price))
}

fn parse_currency(code: &str) -> Result<Currency> {
    match code.to_lowercase().as_str() {
        "usd" => Ok(Currency::USD),
        "gbp" => Ok(Currency::GBP),
        "eur" => Ok(Currency::EUR),
        other => Err(PaymentError::Config(format!(
            "unsupported checkout currency: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn minor_unit_conversion_rounds() {
        assert_eq!(to_minor_units(dec!(19.99)).unwrap(), 1999);
        assert_eq!(to_minor_units(dec!(20)).unwrap(), 2000);
        assert_eq!(to_minor_units(dec!(0)).unwrap(), 0);
        assert_eq!(to_minor_units(dec!(0.004)).unwrap(), 0);
    }

    #[test]
    fn minor_unit_conversion_rejects_unrepresentable_prices() {
        // Multiplication itself overflows.
        assert!(matches!(
            to_minor_units(Decimal::MAX),
            Err(PaymentError::AmountOutOfRange(_))
        ));
        // Multiplies fine but the minor-unit form exceeds i64.
        assert!(matches!(
            to_minor_units(dec!(100000000000000000000)),
            Err(PaymentError::AmountOutOfRange(_))
        ));
    }

    #[test]
    fn cart_metadata_round_trips() {
        let items = vec![CartItem {
            name: "Ticket".into(),
            price: dec!(19.99),
            quantity: 3,
        }];

        let encoded = serde_json::to_string(&items).unwrap();
        let decoded = CartItem::decode_list(&encoded);
        assert_eq!(decoded, items);
    }

    #[test]
    fn currency_codes_parse_case_insensitively() {
        assert_eq!(parse_currency("GBP").unwrap(), Currency::GBP);
        assert_eq!(parse_currency("usd").unwrap(), Currency::USD);
        assert!(parse_currency("doubloons").is_err());
    }
}
