//! Session cart endpoints
//!
//! Prices are computed server-side when an item is added; any price the
//! client sends is ignored.

use axum::Json;
use axum::extract::{Extension, Path, State};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::db::services as services_db;
use crate::error::{AppError, AppResult};
use crate::models::{CartItem, ItemKind, ItemOptions};
use crate::pricing;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    pub total: f64,
    pub item_count: i64,
}

fn summary(state: &AppState, user_id: &str) -> CartSummary {
    let items = state.carts.items(user_id);
    CartSummary {
        total: pricing::cart_total(&items),
        item_count: pricing::item_count(&items),
        // Binary payloads stay server-side
        items: items.iter().map(CartItem::stripped).collect(),
    }
}

pub async fn get_cart(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Json<CartSummary> {
    Json(summary(&state, &user.id))
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub service_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub options: ItemOptions,
}

pub async fn add_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<AddItemRequest>,
) -> AppResult<Json<CartSummary>> {
    if req.quantity <= 0 {
        return Err(AppError::validation("quantity must be positive"));
    }

    let service = services_db::find_active_by_id(&state.pool, &req.service_id)
        .await?
        .ok_or_else(|| AppError::not_found("service"))?;
    let kind = ItemKind::from_db(&service.kind)
        .ok_or_else(|| AppError::internal(format!("unknown service kind '{}'", service.kind)))?;

    // Server-side pricing; the catalog price is per page for documents
    let unit_price = match kind {
        ItemKind::Document => pricing::document_price(
            service.unit_price,
            req.options.copies.unwrap_or(1),
            req.options.pages.as_deref().unwrap_or(""),
            req.options.color.unwrap_or(false),
            req.options.double_sided.unwrap_or(false),
            req.options.paper_size.as_deref().unwrap_or("A4"),
            req.options.total_pages,
        )?,
        ItemKind::Merch => pricing::MERCH_UNIT_PRICE,
        ItemKind::Service => service.unit_price,
    };

    state.carts.add(
        &user.id,
        CartItem {
            service_id: service.id,
            kind,
            name: service.name,
            unit_price,
            quantity: req.quantity,
            options: req.options,
        },
    );

    Ok(Json(summary(&state, &user.id)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

pub async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(index): Path<usize>,
    Json(req): Json<UpdateItemRequest>,
) -> AppResult<Json<CartSummary>> {
    state.carts.set_quantity(&user.id, index, req.quantity)?;
    Ok(Json(summary(&state, &user.id)))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(index): Path<usize>,
) -> AppResult<Json<CartSummary>> {
    state.carts.remove(&user.id, index)?;
    Ok(Json(summary(&state, &user.id)))
}

pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Json<CartSummary> {
    state.carts.clear(&user.id);
    Json(summary(&state, &user.id))
}
