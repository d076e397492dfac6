//! Gateway webhook endpoint
//!
//! Signature verification happens against the raw body, before any JSON
//! parsing. A bad signature is a 400 with no state change; verified events
//! are acked with 200 whether or not they caused a transition, so the
//! gateway stops redelivering.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use serde_json::{Value, json};

use crate::error::{AppError, AppResult};
use crate::gateway::{self, GatewayEvent};
use crate::reconcile;
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "stripe-signature";

pub async fn handle(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let sig_header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::signature("missing signature header"))?;

    gateway::verify_webhook_signature(&body, sig_header, &state.config.gateway_webhook_secret)
        .map_err(AppError::signature)?;

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::validation(format!("invalid webhook body: {e}")))?;
    let event = GatewayEvent::parse(&payload);

    let ack = reconcile::apply_event(&state.pool, &event).await?;
    tracing::debug!(event = ?event, ack = ?ack, "Webhook processed");

    Ok(Json(json!({ "received": true })))
}
