//! HTTP API
//!
//! The webhook endpoint and the health probe are unauthenticated; every
//! storefront route sits behind the bearer-token middleware.

pub mod attachments;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod webhook;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/cart",
            get(cart::get_cart).post(cart::add_item).delete(cart::clear_cart),
        )
        .route("/cart/{index}", put(cart::update_item).delete(cart::remove_item))
        .route("/create-checkout-session", post(checkout::create_session))
        .route("/checkout/success", get(checkout::success))
        .route("/checkout/user-orders", get(checkout::user_orders))
        .route("/orders/{order_id}", get(checkout::order_detail))
        .route(
            "/orders/{order_id}/items/{item_id}/attachment",
            get(attachments::download),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .route("/health", get(health::health))
        .route("/checkout/webhook", post(webhook::handle))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
