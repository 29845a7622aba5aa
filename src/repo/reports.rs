use crate::error::AppResult;
use crate::model::Order;
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TopProduct {
    pub product_name: String,
    pub total_qty: i64,
}

pub async fn orders_between(
    pool: &SqlitePool,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> AppResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE created_at >= ?1 AND created_at < ?2 \
         ORDER BY created_at DESC",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn sales_total_between(
    pool: &SqlitePool,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> AppResult<i64> {
    let (total,): (Option<i64>,) = sqlx::query_as(
        "SELECT SUM(total_cents) FROM orders WHERE created_at >= ?1 AND created_at < ?2",
    )
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;
    Ok(total.unwrap_or(0))
}

/// Products ranked by total quantity sold, using the item's snapshot
/// name join (deleted products fall back to their id).
pub async fn top_products(pool: &SqlitePool, limit: i64) -> AppResult<Vec<TopProduct>> {
    let rows = sqlx::query_as::<_, TopProduct>(
        "SELECT COALESCE(p.name, 'producto #' || oi.product_id) AS product_name, \
                SUM(oi.quantity) AS total_qty \
         FROM order_items oi LEFT JOIN products p ON p.id = oi.product_id \
         GROUP BY oi.product_id ORDER BY total_qty DESC LIMIT ?1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
