//! Order / Payment / OrderItem persistence
//!
//! Order creation is one all-or-nothing transaction; a UNIQUE index on
//! payments.gateway_session_id enforces at-most-one order per checkout
//! session even when duplicate callbacks race.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::gateway::PaymentRef;
use crate::models::OrderStatus;

#[derive(Debug, sqlx::FromRow, Serialize)]
pub struct OrderRow {
    pub id: String,
    pub user_id: String,
    pub total_price: f64,
    pub status_id: i64,
    pub payment_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, sqlx::FromRow, Serialize)]
pub struct PaymentRow {
    pub id: String,
    pub method: String,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub gateway_session_id: String,
    pub gateway_payment_intent_id: Option<String>,
    pub receipt_url: Option<String>,
    pub details: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, sqlx::FromRow, Serialize)]
pub struct OrderItemRow {
    pub id: String,
    pub order_id: String,
    pub service_id: Option<String>,
    pub kind: String,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
    pub subtotal: f64,
    /// Kind-specific options document, JSON (binary payloads stripped)
    pub options: String,
}

/// One row of the user-facing order list (order joined with its payment)
#[derive(Debug, sqlx::FromRow, Serialize)]
pub struct UserOrderRow {
    pub id: String,
    pub total_price: f64,
    pub status_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub payment_status: Option<String>,
    pub receipt_url: Option<String>,
    pub currency: Option<String>,
}

pub struct NewOrderItem {
    pub id: String,
    pub service_id: Option<String>,
    pub kind: String,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
    pub subtotal: f64,
    pub options: String,
}

pub struct NewOrder<'a> {
    pub order_id: &'a str,
    pub user_id: &'a str,
    pub total_price: f64,
    pub status: OrderStatus,
    pub payment_id: &'a str,
    pub method: &'a str,
    pub amount: f64,
    pub currency: &'a str,
    pub payment_status: &'a str,
    pub gateway_session_id: &'a str,
    pub gateway_payment_intent_id: Option<&'a str>,
    pub details: Option<&'a str>,
    pub items: &'a [NewOrderItem],
    pub now: i64,
}

/// Materialize Order + Payment + OrderItems in one transaction.
///
/// Any failure rolls the whole thing back; no partial order is ever
/// visible. A unique-violation on gateway_session_id means a concurrent
/// callback already created the order.
pub async fn create_order_with_payment(
    pool: &SqlitePool,
    new: &NewOrder<'_>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO payments (id, method, amount, currency, status, gateway_session_id,
                               gateway_payment_intent_id, receipt_url, details, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?, ?, ?)",
    )
    .bind(new.payment_id)
    .bind(new.method)
    .bind(new.amount)
    .bind(new.currency)
    .bind(new.payment_status)
    .bind(new.gateway_session_id)
    .bind(new.gateway_payment_intent_id)
    .bind(new.details)
    .bind(new.now)
    .bind(new.now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO orders (id, user_id, total_price, status_id, payment_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(new.order_id)
    .bind(new.user_id)
    .bind(new.total_price)
    .bind(new.status.as_db())
    .bind(new.payment_id)
    .bind(new.now)
    .bind(new.now)
    .execute(&mut *tx)
    .await?;

    for item in new.items {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, service_id, kind, name, quantity, price, subtotal, options)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&item.id)
        .bind(new.order_id)
        .bind(&item.service_id)
        .bind(&item.kind)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.subtotal)
        .bind(&item.options)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

pub async fn find_payment_by_session(
    pool: &SqlitePool,
    gateway_session_id: &str,
) -> Result<Option<PaymentRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE gateway_session_id = ?")
        .bind(gateway_session_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_order_by_payment_id(
    pool: &SqlitePool,
    payment_id: &str,
) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE payment_id = ?")
        .bind(payment_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_order_by_id(
    pool: &SqlitePool,
    order_id: &str,
) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = ?")
        .bind(order_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<UserOrderRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT o.id, o.total_price, o.status_id, o.created_at, o.updated_at,
                p.status AS payment_status, p.receipt_url, p.currency
         FROM orders o
         LEFT JOIN payments p ON p.id = o.payment_id
         WHERE o.user_id = ?
         ORDER BY o.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_items(
    pool: &SqlitePool,
    order_id: &str,
) -> Result<Vec<OrderItemRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = ? ORDER BY id")
        .bind(order_id)
        .fetch_all(pool)
        .await
}

pub async fn find_item(
    pool: &SqlitePool,
    order_id: &str,
    item_id: &str,
) -> Result<Option<OrderItemRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = ? AND id = ?")
        .bind(order_id)
        .bind(item_id)
        .fetch_optional(pool)
        .await
}

/// Outcome of a webhook-driven status transition
#[derive(Debug, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied { order_id: String },
    /// Payment already at the target status, or order in a terminal state
    NoOp,
    /// No payment/order matches the event's identifier
    NotFound,
}

/// Apply a status transition to exactly the Order/Payment pair identified
/// by `payment_ref`, inside one write transaction.
///
/// The conditional update is the transaction's first statement, so it takes
/// SQLite's write lock before any read. Concurrent deliveries for the same
/// payment queue on busy_timeout and the loser re-reads the winner's
/// committed row, landing on the no-op branch instead of failing on a
/// stale snapshot.
pub async fn apply_status_transition(
    pool: &SqlitePool,
    payment_ref: &PaymentRef,
    target_order_status: OrderStatus,
    target_payment_status: &str,
    receipt_url: Option<&str>,
    now: i64,
) -> Result<TransitionOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let (update_sql, select_sql, ref_id) = match payment_ref {
        PaymentRef::Session(id) => (
            "UPDATE payments
             SET status = ?2, receipt_url = COALESCE(?3, receipt_url), updated_at = ?4
             WHERE gateway_session_id = ?1 AND status != ?2
               AND id IN (SELECT payment_id FROM orders WHERE status_id NOT IN (?5, ?6))",
            "SELECT * FROM payments WHERE gateway_session_id = ?",
            id,
        ),
        PaymentRef::Intent(id) => (
            "UPDATE payments
             SET status = ?2, receipt_url = COALESCE(?3, receipt_url), updated_at = ?4
             WHERE gateway_payment_intent_id = ?1 AND status != ?2
               AND id IN (SELECT payment_id FROM orders WHERE status_id NOT IN (?5, ?6))",
            "SELECT * FROM payments WHERE gateway_payment_intent_id = ?",
            id,
        ),
    };

    let updated = sqlx::query(update_sql)
        .bind(ref_id)
        .bind(target_payment_status)
        .bind(receipt_url)
        .bind(now)
        .bind(OrderStatus::Completed.as_db())
        .bind(OrderStatus::Cancelled.as_db())
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if updated == 0 {
        // Replay, terminal order, or an identifier we hold nothing for
        let payment: Option<PaymentRow> = sqlx::query_as(select_sql)
            .bind(ref_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(payment) = payment else {
            return Ok(TransitionOutcome::NotFound);
        };
        let order: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE payment_id = ?")
            .bind(&payment.id)
            .fetch_optional(&mut *tx)
            .await?;
        return Ok(match order {
            Some(_) => TransitionOutcome::NoOp,
            None => TransitionOutcome::NotFound,
        });
    }

    let payment: PaymentRow = sqlx::query_as(select_sql)
        .bind(ref_id)
        .fetch_one(&mut *tx)
        .await?;
    sqlx::query("UPDATE orders SET status_id = ?, updated_at = ? WHERE payment_id = ?")
        .bind(target_order_status.as_db())
        .bind(now)
        .bind(&payment.id)
        .execute(&mut *tx)
        .await?;
    let order_id: String = sqlx::query_scalar("SELECT id FROM orders WHERE payment_id = ?")
        .bind(&payment.id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(TransitionOutcome::Applied { order_id })
}
