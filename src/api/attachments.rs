//! Order item attachment download

use axum::extract::{Extension, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::attachments;
use crate::auth::CurrentUser;
use crate::db::orders as orders_db;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub async fn download(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((order_id, item_id)): Path<(String, String)>,
) -> AppResult<Response> {
    // Ownership check before anything touches the blob store
    orders_db::find_order_by_id(&state.pool, &order_id)
        .await?
        .filter(|o| o.user_id == user.id)
        .ok_or_else(|| AppError::not_found("order"))?;

    let item = orders_db::find_item(&state.pool, &order_id, &item_id)
        .await?
        .ok_or_else(|| AppError::not_found("order item"))?;

    let blob = attachments::resolve(&state, &item)?;
    Ok((
        [(header::CONTENT_TYPE, blob.content_type)],
        blob.bytes,
    )
        .into_response())
}
