//! Webhook reconciliation
//!
//! Maps verified gateway events onto order/payment status transitions.
//! Every event touches at most the single Order/Payment pair its
//! identifiers name; there is no sweep over unrelated pending orders.
//! Replayed deliveries no-op against the conditional transition, so the
//! gateway can redeliver freely.

use sqlx::SqlitePool;

use crate::db::orders::{TransitionOutcome, apply_status_transition};
use crate::error::AppResult;
use crate::gateway::GatewayEvent;
use crate::util;

/// What to tell the gateway about a delivery
#[derive(Debug, PartialEq, Eq)]
pub enum Ack {
    /// Transition applied
    Applied,
    /// Nothing to do: replay, terminal order, ignorable event type, or an
    /// identifier we hold no order for. Acked so the gateway stops
    /// redelivering.
    Ignored,
}

pub async fn apply_event(pool: &SqlitePool, event: &GatewayEvent) -> AppResult<Ack> {
    let Some(class) = event.class() else {
        tracing::debug!(event = ?event, "Ignoring event with no status mapping");
        return Ok(Ack::Ignored);
    };
    let Some(payment_ref) = event.payment_ref() else {
        tracing::debug!(event = ?event, "Ignoring event without a payment reference");
        return Ok(Ack::Ignored);
    };

    let outcome = apply_status_transition(
        pool,
        &payment_ref,
        class.target_order_status(),
        class.target_payment_status(),
        event.receipt_url(),
        util::now_millis(),
    )
    .await?;

    match outcome {
        TransitionOutcome::Applied { order_id } => {
            tracing::info!(
                order_id,
                status = ?class.target_order_status(),
                payment_ref = ?payment_ref,
                "Webhook transition applied"
            );
            Ok(Ack::Applied)
        }
        TransitionOutcome::NoOp => {
            tracing::debug!(payment_ref = ?payment_ref, "Webhook replay, no transition");
            Ok(Ack::Ignored)
        }
        TransitionOutcome::NotFound => {
            // Deliveries can arrive before the success callback creates the
            // order; ack so the gateway's own retry schedule handles it.
            tracing::warn!(payment_ref = ?payment_ref, "Webhook references unknown payment");
            Ok(Ack::Ignored)
        }
    }
}
