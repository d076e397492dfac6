//! Catalog service lookups (catalog CRUD lives elsewhere; read-only here)

use sqlx::SqlitePool;

#[derive(Debug, sqlx::FromRow)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub kind: String,
    /// Per page for document services, per unit otherwise
    pub unit_price: f64,
    pub active: bool,
}

pub async fn find_active_by_id(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<Service>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM services WHERE id = ? AND active = 1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    kind: &str,
    unit_price: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO services (id, name, kind, unit_price, active) VALUES (?, ?, ?, ?, 1)")
        .bind(id)
        .bind(name)
        .bind(kind)
        .bind(unit_price)
        .execute(pool)
        .await?;
    Ok(())
}
