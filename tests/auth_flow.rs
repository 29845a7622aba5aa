mod common;

use axum::http::StatusCode;
use common::{location, seed_user, test_state, TestClient};

#[tokio::test]
async fn register_login_logout_roundtrip() {
    let state = test_state().await;
    let mut client = TestClient::new(state);

    let (status, _, _) = client.get("/register").await;
    assert_eq!(status, StatusCode::OK);

    let (status, headers, _) = client
        .post(
            "/register",
            "username=ana&email=ana%40test.com&password1=segura123&password2=segura123",
        )
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/login");

    // Flash shows on the next page load.
    let (_, _, body) = client.get("/login").await;
    assert!(body.contains("Cuenta creada. Ingresa ahora."));

    client.login("ana", "segura123").await;
    let (_, _, body) = client.get("/").await;
    assert!(body.contains("ana"));

    let (status, headers, _) = client.get("/logout").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/login");

    let (_, _, body) = client.get("/").await;
    assert!(body.contains("Ingresar"));
}

#[tokio::test]
async fn register_rejects_duplicate_username() {
    let state = test_state().await;
    seed_user(state.pool(), "ana", "segura123", "customer").await;

    let mut client = TestClient::new(state);
    let (status, _, body) = client
        .post(
            "/register",
            "username=ana&password1=segura123&password2=segura123",
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ya está en uso"));
}

#[tokio::test]
async fn register_rejects_mismatched_passwords() {
    let state = test_state().await;
    let mut client = TestClient::new(state);

    let (status, _, body) = client
        .post(
            "/register",
            "username=ana&password1=segura123&password2=distinta123",
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Las contraseñas no coinciden"));
}

#[tokio::test]
async fn wrong_password_rerenders_login() {
    let state = test_state().await;
    seed_user(state.pool(), "ana", "segura123", "customer").await;

    let mut client = TestClient::new(state);
    let (status, _, body) = client
        .post("/login", "username=ana&password=incorrecta")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Usuario o contraseña incorrectos"));
}

#[tokio::test]
async fn deactivated_account_cannot_login() {
    let state = test_state().await;
    let user_id = seed_user(state.pool(), "ana", "segura123", "customer").await;
    sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?1")
        .bind(user_id)
        .execute(state.pool())
        .await
        .unwrap();

    let mut client = TestClient::new(state);
    let (status, _, body) = client
        .post("/login", "username=ana&password=segura123")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Usuario o contraseña incorrectos"));
}

#[tokio::test]
async fn my_orders_requires_login() {
    let state = test_state().await;
    let mut client = TestClient::new(state);

    let (status, headers, _) = client.get("/my-orders").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/login");
}

#[tokio::test]
async fn seeded_admin_can_login() {
    let state = test_state().await;
    let mut client = TestClient::new(state);
    client.login("admin", "admin12345").await;

    let (status, _, _) = client.get("/admin/dashboard").await;
    assert_eq!(status, StatusCode::OK);
}
