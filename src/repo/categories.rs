use crate::error::AppResult;
use crate::forms::CategoryInput;
use crate::model::Category;
use chrono::NaiveDateTime;
use sqlx::SqlitePool;

pub async fn list_all(pool: &SqlitePool) -> AppResult<Vec<Category>> {
    let rows = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn list_active(pool: &SqlitePool) -> AppResult<Vec<Category>> {
    let rows = sqlx::query_as::<_, Category>(
        "SELECT * FROM categories WHERE is_active = 1 ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<Category>> {
    let row = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, input: &CategoryInput, now: NaiveDateTime) -> AppResult<i64> {
    let result = sqlx::query(
        "INSERT INTO categories (name, description, image_url, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
    )
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.image_url)
    .bind(input.is_active)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    input: &CategoryInput,
    now: NaiveDateTime,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE categories SET name = ?1, description = ?2, image_url = ?3, is_active = ?4, \
         updated_at = ?5 WHERE id = ?6",
    )
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.image_url)
    .bind(input.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Cascades to the category's products via the foreign key.
pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    sqlx::query("DELETE FROM categories WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
