//! Order finalization
//!
//! Converts a paid checkout session into a durable Order/Payment pair,
//! exactly once per session. The relational write is one all-or-nothing
//! transaction; blob persistence happens after commit and is idempotent,
//! so it may be retried but can never roll an order back.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use uuid::Uuid;

use crate::blob::BlobKind;
use crate::db::orders::{self as orders_db, NewOrder, NewOrderItem};
use crate::error::{AppError, AppResult};
use crate::models::{CartItem, ItemKind, OrderStatus, payment_status};
use crate::pricing;
use crate::state::AppState;
use crate::util;

#[derive(Debug, PartialEq, Eq)]
pub enum FinalizeOutcome {
    Created { order_id: String },
    /// A previous callback (or a concurrent one) already created the order
    AlreadyFinalized { order_id: String },
}

impl FinalizeOutcome {
    pub fn order_id(&self) -> &str {
        match self {
            Self::Created { order_id } | Self::AlreadyFinalized { order_id } => order_id,
        }
    }
}

/// Look up the order a session was already finalized into. A finalized
/// session only ever confirms to the user who owns the order; anyone else
/// gets NotFound, never the order id.
async fn finalized_order_for_session(
    state: &AppState,
    user_id: &str,
    session_id: &str,
) -> AppResult<Option<String>> {
    let Some(payment) = orders_db::find_payment_by_session(&state.pool, session_id).await? else {
        return Ok(None);
    };
    let order = orders_db::find_order_by_payment_id(&state.pool, &payment.id)
        .await?
        .ok_or_else(|| AppError::internal(format!("payment {} has no order", payment.id)))?;
    if order.user_id != user_id {
        return Err(AppError::not_found("order"));
    }
    Ok(Some(order.id))
}

/// Resolve the items to materialize: the in-memory snapshot when it matches
/// the correlation token, else the stripped cart carried through gateway
/// metadata (covers a server restart between checkout start and callback).
fn resolve_items(
    state: &AppState,
    user_id: &str,
    token: &str,
    metadata: &serde_json::Value,
) -> AppResult<Vec<CartItem>> {
    if let Some(pending) = state.carts.pending(user_id) {
        if pending.token != token {
            return Err(AppError::validation("checkout token mismatch"));
        }
        return Ok(pending.items);
    }

    let meta_user = metadata.get("user_id").and_then(|v| v.as_str());
    if meta_user != Some(user_id) {
        return Err(AppError::validation("checkout session belongs to another user"));
    }
    let cart_json = metadata
        .get("cart")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::validation("no cart found for checkout session"))?;
    let items: Vec<CartItem> = serde_json::from_str(cart_json)
        .map_err(|e| AppError::internal(format!("Corrupt cart metadata: {e}")))?;
    if items.is_empty() {
        return Err(AppError::validation("no cart found for checkout session"));
    }
    tracing::warn!(user_id, "Cart snapshot missing, recovered from session metadata");
    Ok(items)
}

/// Persist binary payloads under deterministic natural keys. Failures are
/// logged and swallowed; the committed order stands regardless.
fn persist_attachments(state: &AppState, order_id: &str, items: &[(String, CartItem)]) {
    for (item_id, item) in items {
        let (kind, data) = match item.kind {
            ItemKind::Document => (BlobKind::PrintFiles, item.options.file_data.as_deref()),
            ItemKind::Merch => (BlobKind::MerchDesigns, item.options.design_data.as_deref()),
            ItemKind::Service => continue,
        };
        let Some(data) = data else { continue };

        let bytes = match BASE64.decode(data) {
            Ok(b) => b,
            Err(e) => {
                tracing::error!(order_id, item_id, error = %e, "Attachment payload not valid base64");
                continue;
            }
        };
        let content_type = item
            .options
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");
        if let Err(e) = state.blob.upsert_by_natural_key(
            kind,
            order_id,
            item_id,
            &bytes,
            content_type,
            item.options.filename.as_deref(),
        ) {
            tracing::error!(order_id, item_id, error = %e, "Failed to persist attachment");
        }
    }
}

/// Finalize a paid checkout session into an order, exactly once.
pub async fn finalize_checkout(
    state: &AppState,
    user_id: &str,
    session_id: &str,
    token: &str,
) -> AppResult<FinalizeOutcome> {
    if !util::is_safe_id(session_id) {
        return Err(AppError::validation("invalid session id"));
    }

    // Fast path: this session was already finalized
    if let Some(order_id) = finalized_order_for_session(state, user_id, session_id).await? {
        return Ok(FinalizeOutcome::AlreadyFinalized { order_id });
    }

    let session = state.gateway.retrieve_session(session_id).await?;
    if session.payment_status != "paid" {
        return Err(AppError::validation(format!(
            "checkout session not paid (status: {})",
            session.payment_status
        )));
    }

    let items = resolve_items(state, user_id, token, &session.metadata)?;
    let total = pricing::cart_total(&items);
    let now = util::now_millis();

    let order_id = Uuid::new_v4().to_string();
    let payment_id = Uuid::new_v4().to_string();

    let with_ids: Vec<(String, CartItem)> = items
        .into_iter()
        .map(|item| (Uuid::new_v4().to_string(), item))
        .collect();

    let mut rows = Vec::with_capacity(with_ids.len());
    for (item_id, item) in &with_ids {
        let price = pricing::unit_price(item);
        let options = serde_json::to_string(&item.options.stripped())
            .map_err(|e| AppError::internal(format!("Failed to encode item options: {e}")))?;
        rows.push(NewOrderItem {
            id: item_id.clone(),
            service_id: Some(item.service_id.clone()),
            kind: item.kind.as_db().to_string(),
            name: item.name.clone(),
            quantity: item.quantity,
            price,
            subtotal: pricing::cart_total(std::slice::from_ref(item)),
            options,
        });
    }

    let new = NewOrder {
        order_id: &order_id,
        user_id,
        total_price: total,
        status: OrderStatus::Processing,
        payment_id: &payment_id,
        method: "card",
        amount: total,
        currency: session.currency.as_deref().unwrap_or("eur"),
        payment_status: payment_status::COMPLETED,
        gateway_session_id: session_id,
        gateway_payment_intent_id: session.payment_intent_id.as_deref(),
        details: None,
        items: &rows,
        now,
    };

    match orders_db::create_order_with_payment(&state.pool, &new).await {
        Ok(()) => {}
        Err(e) if e.as_database_error().is_some_and(|d| d.is_unique_violation()) => {
            // Lost the race against a concurrent callback for this session
            let order_id = finalized_order_for_session(state, user_id, session_id)
                .await?
                .ok_or_else(|| AppError::transaction("duplicate session but no order found"))?;
            return Ok(FinalizeOutcome::AlreadyFinalized { order_id });
        }
        Err(e) => return Err(AppError::transaction(e.to_string())),
    }

    persist_attachments(state, &order_id, &with_ids);
    state.carts.consume(user_id);

    tracing::info!(
        user_id,
        order_id,
        session_id,
        total,
        items = with_ids.len(),
        "Order created from checkout session"
    );
    Ok(FinalizeOutcome::Created { order_id })
}
