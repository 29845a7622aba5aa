mod common;

use axum::http::StatusCode;
use common::{location, seed_category, seed_product, seed_user, test_state, TestClient};

#[tokio::test]
async fn pos_is_gated_to_staff() {
    let state = test_state().await;
    seed_user(state.pool(), "ana", "segura123", "customer").await;

    let mut anonymous = TestClient::new(state.clone());
    let (status, headers, _) = anonymous.get("/pos").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/login");

    let mut customer = TestClient::new(state);
    customer.login("ana", "segura123").await;
    let (status, _, _) = customer.get("/pos").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn seller_completes_a_cash_sale_with_change() {
    let state = test_state().await;
    let cat = seed_category(state.pool(), "Bebidas").await;
    let cafe = seed_product(state.pool(), cat, "Cafe Americano", 2500, 10).await;
    seed_user(state.pool(), "cajero", "segura123", "seller").await;

    let mut client = TestClient::new(state.clone());
    client.login("cajero", "segura123").await;

    let (status, headers, _) = client.post(&format!("/pos/add/{cafe}"), "qty=3").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/pos");

    let (_, _, body) = client.get("/pos").await;
    assert!(body.contains("75.00"));

    let (status, _, body) = client.post("/pos/complete", "amount_paid=100").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Recibo"));
    assert!(body.contains("75.00"));
    assert!(body.contains("100.00"));
    assert!(body.contains("25.00"));

    let (number, status_col, payment_status, notes): (String, String, String, String) =
        sqlx::query_as("SELECT order_number, status, payment_status, notes FROM orders")
            .fetch_one(state.pool())
            .await
            .unwrap();
    assert!(number.starts_with("POS-"));
    assert_eq!(status_col, "completed");
    assert_eq!(payment_status, "paid");
    assert_eq!(notes, "Pago: $100.00 | Cambio: $25.00");

    let (stock,): (i64,) = sqlx::query_as("SELECT stock FROM products WHERE id = ?1")
        .bind(cafe)
        .fetch_one(state.pool())
        .await
        .unwrap();
    assert_eq!(stock, 7);

    // Sale screen is empty again.
    let (_, _, body) = client.get("/pos").await;
    assert!(body.contains("No hay productos en la venta"));
}

#[tokio::test]
async fn adding_beyond_stock_is_rejected_with_a_flash() {
    let state = test_state().await;
    let cat = seed_category(state.pool(), "Bebidas").await;
    let cafe = seed_product(state.pool(), cat, "Cafe Americano", 2500, 2).await;
    seed_user(state.pool(), "cajero", "segura123", "seller").await;

    let mut client = TestClient::new(state);
    client.login("cajero", "segura123").await;

    client.post(&format!("/pos/add/{cafe}"), "qty=2").await;
    client.post(&format!("/pos/add/{cafe}"), "qty=1").await;

    let (_, _, body) = client.get("/pos").await;
    assert!(body.contains("Stock insuficiente de Cafe Americano"));
    // Still only the two units that fit.
    assert!(body.contains("50.00"));
}

#[tokio::test]
async fn insufficient_payment_is_rejected() {
    let state = test_state().await;
    let cat = seed_category(state.pool(), "Bebidas").await;
    let cafe = seed_product(state.pool(), cat, "Cafe Americano", 2500, 10).await;
    seed_user(state.pool(), "cajero", "segura123", "seller").await;

    let mut client = TestClient::new(state.clone());
    client.login("cajero", "segura123").await;
    client.post(&format!("/pos/add/{cafe}"), "qty=2").await;

    let (status, headers, _) = client.post("/pos/complete", "amount_paid=30").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/pos");

    let (_, _, body) = client.get("/pos").await;
    assert!(body.contains("Pago insuficiente"));

    let (orders,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
        .fetch_one(state.pool())
        .await
        .unwrap();
    assert_eq!(orders, 0);
}

#[tokio::test]
async fn invalid_amount_is_rejected() {
    let state = test_state().await;
    let cat = seed_category(state.pool(), "Bebidas").await;
    let cafe = seed_product(state.pool(), cat, "Cafe Americano", 2500, 10).await;
    seed_user(state.pool(), "cajero", "segura123", "seller").await;

    let mut client = TestClient::new(state);
    client.login("cajero", "segura123").await;
    client.post(&format!("/pos/add/{cafe}"), "qty=1").await;

    let (status, headers, _) = client.post("/pos/complete", "amount_paid=abc").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/pos");

    let (_, _, body) = client.get("/pos").await;
    assert!(body.contains("Monto de pago inválido"));
}

#[tokio::test]
async fn clearing_the_sale_empties_it() {
    let state = test_state().await;
    let cat = seed_category(state.pool(), "Bebidas").await;
    let cafe = seed_product(state.pool(), cat, "Cafe Americano", 2500, 10).await;
    seed_user(state.pool(), "cajero", "segura123", "seller").await;

    let mut client = TestClient::new(state);
    client.login("cajero", "segura123").await;
    client.post(&format!("/pos/add/{cafe}"), "qty=2").await;
    client.post("/pos/clear", "").await;

    let (_, _, body) = client.get("/pos").await;
    assert!(body.contains("No hay productos en la venta"));
}

#[tokio::test]
async fn completing_an_empty_sale_is_rejected() {
    let state = test_state().await;
    seed_user(state.pool(), "cajero", "segura123", "seller").await;

    let mut client = TestClient::new(state);
    client.login("cajero", "segura123").await;

    let (status, headers, _) = client.post("/pos/complete", "amount_paid=100").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/pos");
}
