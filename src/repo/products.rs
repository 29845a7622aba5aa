use crate::error::AppResult;
use crate::forms::ProductInput;
use crate::model::Product;
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

/// Product joined with its category name, for the admin list.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductWithCategory {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub category_name: String,
    pub kind: Option<String>,
    pub price_cents: i64,
    pub image_url: Option<String>,
    pub stock: i64,
    pub is_active: bool,
}

pub async fn list_all(pool: &SqlitePool) -> AppResult<Vec<ProductWithCategory>> {
    let rows = sqlx::query_as::<_, ProductWithCategory>(
        "SELECT p.id, p.name, p.description, p.category_id, c.name AS category_name, p.kind, \
                p.price_cents, p.image_url, p.stock, p.is_active \
         FROM products p JOIN categories c ON c.id = p.category_id \
         ORDER BY p.name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_active(pool: &SqlitePool, limit: i64) -> AppResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE is_active = 1 ORDER BY id LIMIT ?1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_active_by_category(
    pool: &SqlitePool,
    category_id: i64,
) -> AppResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE category_id = ?1 AND is_active = 1 ORDER BY name",
    )
    .bind(category_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<Product>> {
    let row = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Case-insensitive substring match over name, description and category
/// name. The query string is bound, never interpolated, and `%`/`_` in
/// it are escaped so they match themselves.
pub async fn search_active(pool: &SqlitePool, query: &str) -> AppResult<Vec<Product>> {
    let pattern = format!("%{}%", escape_like(query));
    let rows = sqlx::query_as::<_, Product>(
        "SELECT p.* FROM products p JOIN categories c ON c.id = p.category_id \
         WHERE p.is_active = 1 AND (p.name LIKE ?1 ESCAPE '\\' \
                                    OR p.description LIKE ?1 ESCAPE '\\' \
                                    OR c.name LIKE ?1 ESCAPE '\\') \
         ORDER BY p.name",
    )
    .bind(&pattern)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Active products among the given ids, in id order. Used by the
/// wishlist, which stores bare ids in the session.
pub async fn list_active_by_ids(pool: &SqlitePool, ids: &[i64]) -> AppResult<Vec<Product>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = (1..=ids.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT * FROM products WHERE is_active = 1 AND id IN ({placeholders}) ORDER BY id"
    );
    let mut query = sqlx::query_as::<_, Product>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    Ok(query.fetch_all(pool).await?)
}

pub async fn low_stock(pool: &SqlitePool, threshold: i64, limit: i64) -> AppResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE stock < ?1 AND is_active = 1 ORDER BY stock LIMIT ?2",
    )
    .bind(threshold)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn count(pool: &SqlitePool) -> AppResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn create(pool: &SqlitePool, input: &ProductInput, now: NaiveDateTime) -> AppResult<i64> {
    let result = sqlx::query(
        "INSERT INTO products (name, description, category_id, kind, price_cents, image_url, \
                               stock, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
    )
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.category_id)
    .bind(&input.kind)
    .bind(input.price_cents)
    .bind(&input.image_url)
    .bind(input.stock)
    .bind(input.is_active)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    input: &ProductInput,
    now: NaiveDateTime,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE products SET name = ?1, description = ?2, category_id = ?3, kind = ?4, \
         price_cents = ?5, image_url = ?6, stock = ?7, is_active = ?8, updated_at = ?9 \
         WHERE id = ?10",
    )
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.category_id)
    .bind(&input.kind)
    .bind(input.price_cents)
    .bind(&input.image_url)
    .bind(input.stock)
    .bind(input.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    sqlx::query("DELETE FROM products WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("C_fe"), "C\\_fe");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("cafe"), "cafe");
    }
}
