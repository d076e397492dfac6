//! Checkout bridge
//!
//! Turns the session cart into a hosted gateway checkout session. The cart
//! is snapshotted (not destroyed) before the gateway call so a failed order
//! transaction can be retried, and the snapshot carries the correlation
//! token embedded in the success URL.

use serde_json::json;
use uuid::Uuid;

use crate::cart::SessionCartStore;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::gateway::{CheckoutSession, CreateSessionRequest, GatewayLineItem, PaymentGateway};
use crate::models::CartItem;
use crate::pricing;

/// Build the gateway line items from a cart. Binary payloads never leave
/// the session store; amounts are recomputed server-side.
fn to_line_items(items: &[CartItem]) -> AppResult<Vec<GatewayLineItem>> {
    items
        .iter()
        .map(|item| {
            Ok(GatewayLineItem {
                name: item.name.clone(),
                description: item.options.note.clone(),
                unit_amount: pricing::to_minor_units(pricing::unit_price(item))?,
                quantity: item.quantity,
            })
        })
        .collect()
}

/// Compact cart representation stored in session metadata, used as the
/// fallback source of truth when the in-memory snapshot is gone (e.g. the
/// server restarted between checkout start and the success callback).
fn metadata_cart(items: &[CartItem]) -> AppResult<String> {
    let stripped: Vec<CartItem> = items.iter().map(CartItem::stripped).collect();
    serde_json::to_string(&stripped)
        .map_err(|e| AppError::internal(format!("Failed to encode cart metadata: {e}")))
}

/// Open a hosted checkout session for the user's current cart.
///
/// The snapshot is taken before the gateway call; if the gateway call fails
/// the snapshot is simply overwritten by the next attempt.
pub async fn begin_checkout(
    carts: &SessionCartStore,
    gateway: &dyn PaymentGateway,
    config: &Config,
    user_id: &str,
    email: &str,
) -> AppResult<CheckoutSession> {
    let token = Uuid::new_v4().to_string();
    let pending = carts.snapshot_for_checkout(user_id, &token)?;

    let base = config.public_base_url.trim_end_matches('/');
    let req = CreateSessionRequest {
        line_items: to_line_items(&pending.items)?,
        customer_email: email.to_string(),
        // {CHECKOUT_SESSION_ID} is substituted by the gateway on redirect
        success_url: format!(
            "{base}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}&token={token}"
        ),
        cancel_url: format!("{base}/checkout/cancel"),
        metadata: json!({
            "user_id": user_id,
            "cart": metadata_cart(&pending.items)?,
        }),
    };

    let session = gateway.create_checkout_session(&req).await?;
    tracing::info!(
        user_id,
        session_id = %session.id,
        items = pending.items.len(),
        "Checkout session created"
    );
    Ok(session)
}
