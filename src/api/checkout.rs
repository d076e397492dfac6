//! Checkout and order endpoints

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::auth::CurrentUser;
use crate::checkout as checkout_svc;
use crate::db::orders as orders_db;
use crate::error::{AppError, AppResult};
use crate::orders::{self, FinalizeOutcome};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub url: String,
}

pub async fn create_session(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<CreateSessionResponse>> {
    let session = checkout_svc::begin_checkout(
        &state.carts,
        state.gateway.as_ref(),
        &state.config,
        &user.id,
        &user.email,
    )
    .await?;
    Ok(Json(CreateSessionResponse {
        session_id: session.id,
        url: session.url,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub session_id: String,
    pub token: String,
}

pub async fn success(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<SuccessQuery>,
) -> AppResult<Json<Value>> {
    let outcome =
        orders::finalize_checkout(&state, &user.id, &query.session_id, &query.token).await?;
    let (order_id, created) = match outcome {
        FinalizeOutcome::Created { order_id } => (order_id, true),
        FinalizeOutcome::AlreadyFinalized { order_id } => (order_id, false),
    };
    Ok(Json(json!({ "order_id": order_id, "created": created })))
}

pub async fn user_orders(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<orders_db::UserOrderRow>>> {
    let rows = orders_db::list_by_user(&state.pool, &user.id).await?;
    Ok(Json(rows))
}

pub async fn order_detail(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<String>,
) -> AppResult<Json<Value>> {
    let order = orders_db::find_order_by_id(&state.pool, &order_id)
        .await?
        .filter(|o| o.user_id == user.id)
        .ok_or_else(|| AppError::not_found("order"))?;
    let items = orders_db::list_items(&state.pool, &order_id).await?;
    Ok(Json(json!({ "order": order, "items": items })))
}
