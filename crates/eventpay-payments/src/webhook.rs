//! Webhook Verification
//!
//! Validates inbound processor notifications before anything touches the
//! payload. The signature is computed over the raw request bytes; parsing
//! the body first would change what was signed and the check could never
//! match. A failed check maps to HTTP 400 upstream, which makes the
//! processor retry the delivery.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::{PaymentError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Events older than this are rejected as replays.
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Allowed clock skew for events timestamped in the future.
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// The only event kind that produces side effects.
pub const PAYMENT_COMPLETED: &str = "checkout.session.completed";

/// Parsed components of a `Stripe-Signature` header.
///
/// Format: `t=<unix timestamp>,v1=<hex hmac>`; unknown schemes are ignored
/// for forward compatibility.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub v1: Vec<u8>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self> {
        let mut timestamp = None;
        let mut v1 = None;

        for part in header.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                return Err(PaymentError::SignatureHeader(
                    "expected key=value pairs".into(),
                ));
            };
            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        PaymentError::SignatureHeader("invalid timestamp".into())
                    })?);
                }
                "v1" => {
                    v1 = Some(hex::decode(value).map_err(|_| {
                        PaymentError::SignatureHeader("invalid v1 hex".into())
                    })?);
                }
                _ => {}
            }
        }

        Ok(Self {
            timestamp: timestamp.ok_or_else(|| {
                PaymentError::SignatureHeader("missing timestamp".into())
            })?,
            v1: v1.ok_or_else(|| {
                PaymentError::SignatureHeader("missing v1 signature".into())
            })?,
        })
    }
}

/// Event envelope, deserialized only after the signature verifies.
#[derive(Debug, Deserialize)]
struct EventEnvelope {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: serde_json::Value,
}

/// A notification whose signature checked out.
///
/// Created here, consumed once by the normalizer, then discarded.
#[derive(Clone, Debug)]
pub struct VerifiedEvent {
    /// Processor-assigned event id (`evt_…`), used for deduplication.
    pub id: String,
    /// Kind discriminant, e.g. `checkout.session.completed`.
    pub kind: String,
    /// The event's `data.object`, left free-form for the normalizer.
    pub payload: serde_json::Value,
}

/// Verifier for signed webhook deliveries.
pub struct WebhookVerifier {
    secret: String,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| PaymentError::Config("STRIPE_WEBHOOK_SECRET not set".into()))?;
        Ok(Self::new(secret))
    }

    /// Verify the raw body against the signature header, then parse.
    ///
    /// The signed payload is `<timestamp>.<raw body>`; the comparison is
    /// constant-time.
    pub fn verify(&self, body: &[u8], signature_header: &str) -> Result<VerifiedEvent> {
        let header = SignatureHeader::parse(signature_header)?;
        check_timestamp(header.timestamp)?;

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| PaymentError::Config("unusable webhook secret".into()))?;
        mac.update(header.timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        mac.verify_slice(&header.v1)
            .map_err(|_| PaymentError::SignatureInvalid)?;

        let envelope: EventEnvelope = serde_json::from_slice(body)?;
        Ok(VerifiedEvent {
            id: envelope.id,
            kind: envelope.kind,
            payload: envelope.data.object,
        })
    }
}

fn check_timestamp(timestamp: i64) -> Result<()> {
    let age = chrono::Utc::now().timestamp() - timestamp;
    if age > MAX_EVENT_AGE_SECS || age < -MAX_CLOCK_SKEW_SECS {
        return Err(PaymentError::TimestampOutOfRange);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";

    fn sign(secret: &str, timestamp: i64, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.{payload}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn completed_payload() -> &'static str {
        r#"{"id":"evt_test123","type":"checkout.session.completed","data":{"object":{"amount_total":3500}}}"#
    }

    #[test]
    fn parse_header_with_v1_only() {
        let header_str = format!("t=1234567890,v1={}", "a".repeat(64));
        let header = SignatureHeader::parse(&header_str).unwrap();
        assert_eq!(header.timestamp, 1234567890);
        assert_eq!(header.v1.len(), 32);
    }

    #[test]
    fn parse_header_ignores_unknown_schemes() {
        let header_str = format!("t=1234567890,v1={},v0={}", "a".repeat(64), "b".repeat(64));
        assert!(SignatureHeader::parse(&header_str).is_ok());
    }

    #[test]
    fn parse_header_missing_parts_fails() {
        assert!(matches!(
            SignatureHeader::parse("t=1234567890"),
            Err(PaymentError::SignatureHeader(_))
        ));
        assert!(matches!(
            SignatureHeader::parse(&format!("v1={}", "a".repeat(64))),
            Err(PaymentError::SignatureHeader(_))
        ));
        assert!(matches!(
            SignatureHeader::parse("t=nope,v1=aa"),
            Err(PaymentError::SignatureHeader(_))
        ));
        assert!(matches!(
            SignatureHeader::parse("t=1,v1=not_hex"),
            Err(PaymentError::SignatureHeader(_))
        ));
    }

    #[test]
    fn verify_valid_signature() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = completed_payload();
        let timestamp = chrono::Utc::now().timestamp();
        let header = format!("t={timestamp},v1={}", sign(TEST_SECRET, timestamp, payload));

        let event = verifier.verify(payload.as_bytes(), &header).unwrap();
        assert_eq!(event.id, "evt_test123");
        assert_eq!(event.kind, PAYMENT_COMPLETED);
        assert_eq!(event.payload["amount_total"], 3500);
    }

    #[test]
    fn verify_wrong_secret_fails() {
        let verifier = WebhookVerifier::new("whsec_other");
        let payload = completed_payload();
        let timestamp = chrono::Utc::now().timestamp();
        let header = format!("t={timestamp},v1={}", sign(TEST_SECRET, timestamp, payload));

        assert!(matches!(
            verifier.verify(payload.as_bytes(), &header),
            Err(PaymentError::SignatureInvalid)
        ));
    }

    #[test]
    fn verify_tampered_body_fails() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp();
        let header = format!(
            "t={timestamp},v1={}",
            sign(TEST_SECRET, timestamp, completed_payload())
        );

        let tampered = r#"{"id":"evt_forged","type":"checkout.session.completed","data":{"object":{}}}"#;
        assert!(matches!(
            verifier.verify(tampered.as_bytes(), &header),
            Err(PaymentError::SignatureInvalid)
        ));
    }

    #[test]
    fn verify_stale_timestamp_fails() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = completed_payload();
        let timestamp = chrono::Utc::now().timestamp() - 600;
        let header = format!("t={timestamp},v1={}", sign(TEST_SECRET, timestamp, payload));

        assert!(matches!(
            verifier.verify(payload.as_bytes(), &header),
            Err(PaymentError::TimestampOutOfRange)
        ));
    }

    #[test]
    fn verify_future_timestamp_beyond_skew_fails() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = completed_payload();
        let timestamp = chrono::Utc::now().timestamp() + 120;
        let header = format!("t={timestamp},v1={}", sign(TEST_SECRET, timestamp, payload));

        assert!(matches!(
            verifier.verify(payload.as_bytes(), &header),
            Err(PaymentError::TimestampOutOfRange)
        ));
    }

    #[test]
    fn verify_parses_only_after_signature_passes() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = "not json at all";
        let timestamp = chrono::Utc::now().timestamp();

        // Unsigned garbage never reaches the parser.
        let bad_header = format!("t={timestamp},v1={}", "a".repeat(64));
        assert!(matches!(
            verifier.verify(payload.as_bytes(), &bad_header),
            Err(PaymentError::SignatureInvalid)
        ));

        // Correctly signed garbage surfaces as a parse error.
        let good_header = format!("t={timestamp},v1={}", sign(TEST_SECRET, timestamp, payload));
        assert!(matches!(
            verifier.verify(payload.as_bytes(), &good_header),
            Err(PaymentError::Json(_))
        ));
    }
}
