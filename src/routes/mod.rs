//! One handler per route, grouped the way the site is navigated:
//! storefront, account, cart, wishlist, point of sale, admin panel.

pub mod account;
pub mod admin;
pub mod cart;
pub mod pos;
pub mod storefront;
pub mod wishlist;

use crate::auth;
use crate::error::AppResult;
use crate::state::AppState;
use axum::response::Html;
use tera::Context;

/// Render a page template with the context every page shares: the
/// logged-in user, pending flash messages and the cart badge count.
pub(crate) async fn page(
    state: &AppState,
    session_id: &str,
    template: &str,
    mut ctx: Context,
) -> AppResult<Html<String>> {
    let user = auth::current_user(state, session_id).await?;
    let flashes = state.sessions().take_flashes(session_id);
    let cart_count: i64 = state
        .sessions()
        .with_session(session_id, |s| s.cart.values().sum());

    ctx.insert("current_user", &user);
    ctx.insert("flashes", &flashes);
    ctx.insert("cart_count", &cart_count);

    let html = state.templates().render(template, &ctx)?;
    Ok(Html(html))
}
