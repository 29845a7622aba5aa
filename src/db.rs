//! Database pool setup, embedded migrations and first-run seeding.

use crate::config::ServerConfig;
use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("invalid database URL: {database_url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    // A shared in-memory database only exists on one connection.
    let max_connections = if database_url.contains(":memory:") { 1 } else { 8 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .context("failed to open database")?;

    Ok(pool)
}

pub async fn init_database(pool: &SqlitePool, config: &ServerConfig) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("migrations failed")?;

    ensure_seed_admin(pool, config).await?;

    info!("database ready");
    Ok(())
}

/// Create the administrator account when no user exists yet, so a fresh
/// install can log into the panel.
async fn ensure_seed_admin(pool: &SqlitePool, config: &ServerConfig) -> Result<()> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let hash = bcrypt::hash(&config.seed_admin_password, bcrypt::DEFAULT_COST)
        .context("failed to hash seed admin password")?;
    let now = chrono::Utc::now().naive_utc();

    sqlx::query(
        "INSERT INTO users (username, email, password_hash, role, is_active, created_at) \
         VALUES (?1, NULL, ?2, 'admin', 1, ?3)",
    )
    .bind(&config.seed_admin_username)
    .bind(&hash)
    .bind(now)
    .execute(pool)
    .await?;

    info!(username = %config.seed_admin_username, "seeded administrator account");
    Ok(())
}
