#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use cafeito::{build_router, AppState, ServerConfig};
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub async fn test_state() -> Arc<AppState> {
    let config = ServerConfig {
        database_url: "sqlite::memory:".to_string(),
        http_bind_address: "127.0.0.1:0".parse().unwrap(),
        template_dir: "templates".into(),
        session_ttl: Duration::from_secs(3600),
        low_stock_threshold: 10,
        seed_admin_username: "admin".to_string(),
        seed_admin_password: "admin12345".to_string(),
    };
    let pool = cafeito::db::init_pool(&config.database_url).await.unwrap();
    cafeito::db::init_database(&pool, &config).await.unwrap();
    Arc::new(AppState::new(Arc::new(config), pool).unwrap())
}

/// Minimal in-process client that carries the session cookie between
/// requests, like a browser would.
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            router: build_router(state),
            cookie: None,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        if let Some(set_cookie) = headers.get(header::SET_COOKIE) {
            let pair = set_cookie
                .to_str()
                .unwrap()
                .split(';')
                .next()
                .unwrap()
                .to_string();
            self.cookie = Some(pair);
        }
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8_lossy(&body).into_owned())
    }

    pub async fn get(&mut self, path: &str) -> (StatusCode, HeaderMap, String) {
        let mut builder = Request::builder().uri(path);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post(&mut self, path: &str, form: &str) -> (StatusCode, HeaderMap, String) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    pub async fn login(&mut self, username: &str, password: &str) {
        let (status, headers, _) = self
            .post("/login", &format!("username={username}&password={password}"))
            .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), "/");
    }
}

pub fn location(headers: &HeaderMap) -> &str {
    headers
        .get(header::LOCATION)
        .expect("response has a Location header")
        .to_str()
        .unwrap()
}

pub async fn seed_category(pool: &SqlitePool, name: &str) -> i64 {
    let now = chrono::Utc::now().naive_utc();
    sqlx::query(
        "INSERT INTO categories (name, is_active, created_at, updated_at) VALUES (?1, 1, ?2, ?2)",
    )
    .bind(name)
    .bind(now)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

pub async fn seed_product(
    pool: &SqlitePool,
    category_id: i64,
    name: &str,
    price_cents: i64,
    stock: i64,
) -> i64 {
    let now = chrono::Utc::now().naive_utc();
    sqlx::query(
        "INSERT INTO products (name, category_id, price_cents, stock, is_active, \
                               created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
    )
    .bind(name)
    .bind(category_id)
    .bind(price_cents)
    .bind(stock)
    .bind(now)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

pub async fn seed_inactive_product(
    pool: &SqlitePool,
    category_id: i64,
    name: &str,
) -> i64 {
    let now = chrono::Utc::now().naive_utc();
    sqlx::query(
        "INSERT INTO products (name, category_id, price_cents, stock, is_active, \
                               created_at, updated_at) \
         VALUES (?1, ?2, 1000, 5, 0, ?3, ?3)",
    )
    .bind(name)
    .bind(category_id)
    .bind(now)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

pub async fn seed_user(pool: &SqlitePool, username: &str, password: &str, role: &str) -> i64 {
    let hash = cafeito::auth::hash_password(password).unwrap();
    let now = chrono::Utc::now().naive_utc();
    sqlx::query(
        "INSERT INTO users (username, password_hash, role, is_active, created_at) \
         VALUES (?1, ?2, ?3, 1, ?4)",
    )
    .bind(username)
    .bind(&hash)
    .bind(role)
    .bind(now)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}
