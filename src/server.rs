//! Router assembly and server lifecycle.

use crate::config::ServerConfig;
use crate::db;
use crate::routes::{account, admin, cart, pos, storefront, wishlist};
use crate::state::AppState;
use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Storefront
        .route("/", get(storefront::home))
        .route("/search", get(storefront::search))
        .route("/category/{id}", get(storefront::category_products))
        .route("/product/{id}", get(storefront::product_detail))
        // Account
        .route(
            "/register",
            get(account::register_form).post(account::register_submit),
        )
        .route("/login", get(account::login_form).post(account::login_submit))
        .route("/logout", get(account::logout).post(account::logout))
        .route("/my-orders", get(account::my_orders))
        .route("/order/{id}", get(account::order_detail))
        // Cart and checkout
        .route("/cart", get(cart::cart_view))
        .route("/cart/add/{id}", post(cart::add_to_cart))
        .route("/cart/remove/{id}", post(cart::remove_from_cart))
        .route("/cart/update/{id}", post(cart::update_cart_qty))
        .route(
            "/checkout",
            get(cart::checkout_form).post(cart::checkout_submit),
        )
        .route("/api/cart-count", get(cart::cart_count))
        // Wishlist
        .route("/wishlist", get(wishlist::wishlist_view))
        .route("/wishlist/add/{id}", post(wishlist::add_to_wishlist))
        .route("/wishlist/remove/{id}", post(wishlist::remove_from_wishlist))
        // Point of sale
        .route("/pos", get(pos::pos_view))
        .route("/pos/add/{id}", post(pos::add_to_sale))
        .route("/pos/remove/{id}", post(pos::remove_from_sale))
        .route("/pos/clear", post(pos::clear_sale))
        .route("/pos/complete", post(pos::complete_sale))
        // Admin panel
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/products", get(admin::product_list))
        .route(
            "/admin/products/new",
            get(admin::product_create_form).post(admin::product_create_submit),
        )
        .route(
            "/admin/products/{id}/edit",
            get(admin::product_edit_form).post(admin::product_edit_submit),
        )
        .route("/admin/products/{id}/delete", post(admin::product_delete))
        .route("/admin/categories", get(admin::category_list))
        .route(
            "/admin/categories/new",
            get(admin::category_create_form).post(admin::category_create_submit),
        )
        .route(
            "/admin/categories/{id}/edit",
            get(admin::category_edit_form).post(admin::category_edit_submit),
        )
        .route("/admin/categories/{id}/delete", post(admin::category_delete))
        .route("/admin/orders", get(admin::order_list))
        .route("/admin/orders/{id}", get(admin::order_detail))
        .route("/admin/orders/{id}/status", post(admin::order_update_status))
        .route("/admin/users", get(admin::user_list))
        .route(
            "/admin/users/new",
            get(admin::user_create_form).post(admin::user_create_submit),
        )
        .route(
            "/admin/users/{id}/edit",
            get(admin::user_edit_form).post(admin::user_edit_submit),
        )
        .route("/admin/users/{id}/delete", post(admin::user_delete))
        .route("/admin/reports", get(admin::sales_report))
        .with_state(state)
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("received SIGTERM, initiating graceful shutdown");
        },
    }
}

pub async fn run_server(config: ServerConfig) -> Result<()> {
    let config = Arc::new(config);

    let pool = db::init_pool(&config.database_url).await?;
    db::init_database(&pool, &config).await?;

    let state = Arc::new(AppState::new(config.clone(), pool)?);
    state.sessions().clone().start_cleanup_task();

    let router = build_router(state);

    let listener = TcpListener::bind(&config.http_bind_address).await?;
    let actual_addr = listener.local_addr()?;
    tracing::info!(bind = %actual_addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}
