mod common;

use axum::http::StatusCode;
use common::{location, seed_category, seed_product, seed_user, test_state, TestClient};

#[tokio::test]
async fn panel_is_gated_to_admins() {
    let state = test_state().await;
    seed_user(state.pool(), "ana", "segura123", "customer").await;
    seed_user(state.pool(), "cajero", "segura123", "seller").await;

    let mut anonymous = TestClient::new(state.clone());
    let (status, headers, _) = anonymous.get("/admin/dashboard").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/login");

    let mut customer = TestClient::new(state.clone());
    customer.login("ana", "segura123").await;
    let (status, _, _) = customer.get("/admin/dashboard").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Sellers run the POS but not the panel.
    let mut seller = TestClient::new(state);
    seller.login("cajero", "segura123").await;
    let (status, _, _) = seller.get("/admin/products").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn dashboard_flags_low_stock() {
    let state = test_state().await;
    let cat = seed_category(state.pool(), "Bebidas").await;
    seed_product(state.pool(), cat, "Cafe Americano", 2500, 3).await;
    seed_product(state.pool(), cat, "Te Verde", 2000, 50).await;

    let mut client = TestClient::new(state);
    client.login("admin", "admin12345").await;

    let (status, _, body) = client.get("/admin/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    let low_stock_section = body.split("Stock bajo").nth(1).unwrap();
    assert!(low_stock_section.contains("Cafe Americano"));
    assert!(!low_stock_section
        .split("Órdenes recientes")
        .next()
        .unwrap()
        .contains("Te Verde"));
}

#[tokio::test]
async fn admin_manages_categories_and_products() {
    let state = test_state().await;

    let mut client = TestClient::new(state.clone());
    client.login("admin", "admin12345").await;

    let (status, headers, _) = client
        .post("/admin/categories/new", "name=Bebidas&is_active=on")
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/admin/categories");

    let (cat_id,): (i64,) = sqlx::query_as("SELECT id FROM categories WHERE name = 'Bebidas'")
        .fetch_one(state.pool())
        .await
        .unwrap();

    let (status, headers, _) = client
        .post(
            "/admin/products/new",
            &format!("name=Latte&category_id={cat_id}&price=45.50&stock=10&is_active=on"),
        )
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/admin/products");

    let (price, stock): (i64, i64) =
        sqlx::query_as("SELECT price_cents, stock FROM products WHERE name = 'Latte'")
            .fetch_one(state.pool())
            .await
            .unwrap();
    assert_eq!(price, 4550);
    assert_eq!(stock, 10);

    let (_, _, body) = client.get("/admin/products").await;
    assert!(body.contains("Latte"));
    assert!(body.contains("45.50"));

    // Edit the price.
    let (prod_id,): (i64,) = sqlx::query_as("SELECT id FROM products WHERE name = 'Latte'")
        .fetch_one(state.pool())
        .await
        .unwrap();
    let (status, _, _) = client
        .post(
            &format!("/admin/products/{prod_id}/edit"),
            &format!("name=Latte&category_id={cat_id}&price=50.00&stock=8&is_active=on"),
        )
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (price,): (i64,) = sqlx::query_as("SELECT price_cents FROM products WHERE id = ?1")
        .bind(prod_id)
        .fetch_one(state.pool())
        .await
        .unwrap();
    assert_eq!(price, 5000);

    // Delete it.
    let (status, _, _) = client
        .post(&format!("/admin/products/{prod_id}/delete"), "")
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(state.pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn invalid_product_rerenders_with_errors() {
    let state = test_state().await;
    let cat = seed_category(state.pool(), "Bebidas").await;

    let mut client = TestClient::new(state);
    client.login("admin", "admin12345").await;

    let (status, _, body) = client
        .post(
            "/admin/products/new",
            &format!("name=Latte&category_id={cat}&price=0&stock=-2"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("El precio debe ser mayor a 0"));
    assert!(body.contains("El stock no puede ser negativo"));
}

#[tokio::test]
async fn deleting_a_category_cascades_to_its_products() {
    let state = test_state().await;
    let cat = seed_category(state.pool(), "Bebidas").await;
    seed_product(state.pool(), cat, "Cafe Americano", 2500, 10).await;

    let mut client = TestClient::new(state.clone());
    client.login("admin", "admin12345").await;

    let (status, _, _) = client
        .post(&format!("/admin/categories/{cat}/delete"), "")
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (products,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(state.pool())
        .await
        .unwrap();
    assert_eq!(products, 0);
}

#[tokio::test]
async fn order_status_can_be_updated_and_filtered() {
    let state = test_state().await;
    let cat = seed_category(state.pool(), "Bebidas").await;
    let cafe = seed_product(state.pool(), cat, "Cafe Americano", 2500, 10).await;
    seed_user(state.pool(), "ana", "segura123", "customer").await;

    let mut ana = TestClient::new(state.clone());
    ana.login("ana", "segura123").await;
    ana.post(&format!("/cart/add/{cafe}"), "qty=1").await;
    ana.post("/checkout", "").await;

    let (order_id, number): (i64, String) = sqlx::query_as("SELECT id, order_number FROM orders")
        .fetch_one(state.pool())
        .await
        .unwrap();

    let mut admin = TestClient::new(state.clone());
    admin.login("admin", "admin12345").await;

    let (_, _, body) = admin.get("/admin/orders?status=pending").await;
    assert!(body.contains(&number));
    let (_, _, body) = admin.get("/admin/orders?status=completed").await;
    assert!(!body.contains(&number));

    let (status, headers, _) = admin
        .post(&format!("/admin/orders/{order_id}/status"), "status=completed")
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/admin/orders");

    let (status_col,): (String,) = sqlx::query_as("SELECT status FROM orders WHERE id = ?1")
        .bind(order_id)
        .fetch_one(state.pool())
        .await
        .unwrap();
    assert_eq!(status_col, "completed");
}

#[tokio::test]
async fn pos_payment_details_show_on_the_order() {
    let state = test_state().await;
    let cat = seed_category(state.pool(), "Bebidas").await;
    let cafe = seed_product(state.pool(), cat, "Cafe Americano", 2500, 10).await;
    seed_user(state.pool(), "cajero", "segura123", "seller").await;

    let mut seller = TestClient::new(state.clone());
    seller.login("cajero", "segura123").await;
    seller.post(&format!("/pos/add/{cafe}"), "qty=2").await;
    seller.post("/pos/complete", "amount_paid=60").await;

    let (order_id,): (i64,) = sqlx::query_as("SELECT id FROM orders")
        .fetch_one(state.pool())
        .await
        .unwrap();

    let mut admin = TestClient::new(state);
    admin.login("admin", "admin12345").await;
    let (_, _, body) = admin.get(&format!("/admin/orders/{order_id}")).await;
    assert!(body.contains("Pago recibido: $60.00"));
    assert!(body.contains("Cambio: $10.00"));
}

#[tokio::test]
async fn admin_manages_users() {
    let state = test_state().await;

    let mut client = TestClient::new(state.clone());
    client.login("admin", "admin12345").await;

    let (status, headers, _) = client
        .post(
            "/admin/users/new",
            "username=cajero&password1=segura123&password2=segura123&role=seller",
        )
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/admin/users");

    let (user_id, role): (i64, String) =
        sqlx::query_as("SELECT id, role FROM users WHERE username = 'cajero'")
            .fetch_one(state.pool())
            .await
            .unwrap();
    assert_eq!(role, "seller");

    let (status, _, _) = client
        .post(
            &format!("/admin/users/{user_id}/edit"),
            "email=c%40test.com&role=customer&is_active=on",
        )
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (role, email): (String, String) =
        sqlx::query_as("SELECT role, email FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_one(state.pool())
            .await
            .unwrap();
    assert_eq!(role, "customer");
    assert_eq!(email, "c@test.com");

    let (status, _, _) = client
        .post(&format!("/admin/users/{user_id}/delete"), "")
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_one(state.pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn admin_cannot_delete_their_own_account() {
    let state = test_state().await;

    let mut client = TestClient::new(state.clone());
    client.login("admin", "admin12345").await;

    let (admin_id,): (i64,) = sqlx::query_as("SELECT id FROM users WHERE username = 'admin'")
        .fetch_one(state.pool())
        .await
        .unwrap();

    let (status, headers, _) = client
        .post(&format!("/admin/users/{admin_id}/delete"), "")
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/admin/users");

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE id = ?1")
        .bind(admin_id)
        .fetch_one(state.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);

    let (_, _, body) = client.get("/admin/users").await;
    assert!(body.contains("No puedes eliminar tu propia cuenta"));
}

#[tokio::test]
async fn sales_report_covers_the_requested_range() {
    let state = test_state().await;
    let cat = seed_category(state.pool(), "Bebidas").await;
    let cafe = seed_product(state.pool(), cat, "Cafe Americano", 2500, 10).await;
    seed_user(state.pool(), "cajero", "segura123", "seller").await;

    let mut seller = TestClient::new(state.clone());
    seller.login("cajero", "segura123").await;
    seller.post(&format!("/pos/add/{cafe}"), "qty=2").await;
    seller.post("/pos/complete", "amount_paid=50").await;

    let (number,): (String,) = sqlx::query_as("SELECT order_number FROM orders")
        .fetch_one(state.pool())
        .await
        .unwrap();

    let mut admin = TestClient::new(state);
    admin.login("admin", "admin12345").await;

    // Defaults to today, which includes the sale just made.
    let (status, _, body) = admin.get("/admin/reports").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&number));
    assert!(body.contains("50.00"));
    assert!(body.contains("Cafe Americano"));

    // A past range is empty.
    let (_, _, body) = admin
        .get("/admin/reports?start_date=2020-01-01&end_date=2020-01-31")
        .await;
    assert!(!body.contains(&number));
}
