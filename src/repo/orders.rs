use crate::error::AppResult;
use crate::model::{Order, OrderStatus};
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

/// Order line joined with the product name for display. The product may
/// have been deleted since the sale; history keeps the id either way.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItemView {
    pub product_id: i64,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<Order>> {
    let row = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// The order only if it belongs to the given customer.
pub async fn find_for_customer(
    pool: &SqlitePool,
    id: i64,
    customer_id: i64,
) -> AppResult<Option<Order>> {
    let row = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE id = ?1 AND customer_id = ?2",
    )
    .bind(id)
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn list_for_customer(pool: &SqlitePool, customer_id: i64) -> AppResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE customer_id = ?1 ORDER BY created_at DESC",
    )
    .bind(customer_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_all(pool: &SqlitePool, status: Option<OrderStatus>) -> AppResult<Vec<Order>> {
    let rows = match status {
        Some(status) => {
            sqlx::query_as::<_, Order>(
                "SELECT * FROM orders WHERE status = ?1 ORDER BY created_at DESC",
            )
            .bind(status)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows)
}

pub async fn recent(pool: &SqlitePool, limit: i64) -> AppResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders ORDER BY created_at DESC LIMIT ?1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn items_for_order(pool: &SqlitePool, order_id: i64) -> AppResult<Vec<OrderItemView>> {
    let rows = sqlx::query_as::<_, OrderItemView>(
        "SELECT oi.product_id, p.name AS product_name, oi.quantity, oi.unit_price_cents, \
                oi.subtotal_cents \
         FROM order_items oi LEFT JOIN products p ON p.id = oi.product_id \
         WHERE oi.order_id = ?1 ORDER BY oi.id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn update_status(
    pool: &SqlitePool,
    id: i64,
    status: OrderStatus,
    now: NaiveDateTime,
) -> AppResult<()> {
    sqlx::query("UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count(pool: &SqlitePool) -> AppResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn distinct_customers(pool: &SqlitePool) -> AppResult<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(DISTINCT customer_id) FROM orders WHERE customer_id IS NOT NULL",
    )
    .fetch_one(pool)
    .await?;
    Ok(count)
}
