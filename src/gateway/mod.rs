//! Payment gateway integration
//!
//! The gateway is reached over its REST API (no SDK dependency) and
//! injected behind the [`PaymentGateway`] trait so tests can substitute a
//! scripted double.

pub mod events;
pub mod stripe;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;

pub use events::{EventClass, GatewayEvent, PaymentRef};
pub use stripe::StripeGateway;

/// Gateway-facing line item: transferable metadata only, never binary
/// payloads.
#[derive(Debug, Clone)]
pub struct GatewayLineItem {
    pub name: String,
    pub description: Option<String>,
    /// Unit price in minor currency units (cents)
    pub unit_amount: i64,
    pub quantity: i64,
}

/// Request to open a hosted checkout session
#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub line_items: Vec<GatewayLineItem>,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
    /// Fallback reconciliation payload carried through the gateway
    pub metadata: serde_json::Value,
}

/// A freshly created hosted checkout session
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// State of a checkout session as reported by the gateway
#[derive(Debug, Clone)]
pub struct SessionDetails {
    pub id: String,
    /// "paid" | "unpaid" | "no_payment_required"
    pub payment_status: String,
    pub payment_intent_id: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Network failure or timeout; the HTTP caller may retry
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
    /// The gateway answered but not with what we expected
    #[error("gateway protocol error: {0}")]
    Protocol(String),
}

/// Outbound payment gateway capability set
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        req: &CreateSessionRequest,
    ) -> Result<CheckoutSession, GatewayError>;

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionDetails, GatewayError>;
}

/// Maximum accepted webhook event age, to limit replays
const REPLAY_WINDOW_SECS: i64 = 300;

/// Verify a webhook signature header of the form `t=<unix_ts>,v1=<hex hmac>`
/// (HMAC-SHA256 over `"{t}.{payload}"`).
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signature = "";
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }

    if timestamp.is_empty() || signature.is_empty() {
        return Err("Invalid signature header");
    }

    let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap_or(""));
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(signed_payload.as_bytes());

    // Constant-time comparison via verify_slice
    let sig_bytes = hex::decode(signature).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Webhook signature mismatch")?;

    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > REPLAY_WINDOW_SECS {
        return Err("Webhook timestamp too old");
    }

    Ok(())
}

/// Sign a payload the way the gateway does. Test helper for webhook tests.
pub fn sign_webhook_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap_or(""));
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC key");
    mac.update(signed_payload.as_bytes());
    let sig = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={sig}")
}
