use crate::error::AppResult;
use crate::forms::{UserCreateInput, UserEditInput};
use crate::model::User;
use chrono::NaiveDateTime;
use sqlx::SqlitePool;

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<User>> {
    let row = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> AppResult<Option<User>> {
    let row = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?1")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn username_exists(pool: &SqlitePool, username: &str) -> AppResult<bool> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ?1")
        .bind(username)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

pub async fn list_all(pool: &SqlitePool) -> AppResult<Vec<User>> {
    let rows = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY username")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn create(
    pool: &SqlitePool,
    input: &UserCreateInput,
    password_hash: &str,
    now: NaiveDateTime,
) -> AppResult<i64> {
    let result = sqlx::query(
        "INSERT INTO users (username, email, password_hash, role, is_active, created_at) \
         VALUES (?1, ?2, ?3, ?4, 1, ?5)",
    )
    .bind(&input.username)
    .bind(&input.email)
    .bind(password_hash)
    .bind(input.role)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn update(pool: &SqlitePool, id: i64, input: &UserEditInput) -> AppResult<()> {
    sqlx::query("UPDATE users SET email = ?1, role = ?2, is_active = ?3 WHERE id = ?4")
        .bind(&input.email)
        .bind(input.role)
        .bind(input.is_active)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    sqlx::query("DELETE FROM users WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
