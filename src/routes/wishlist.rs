//! Session wishlist. The add/remove endpoints answer JSON for the
//! storefront's buttons.

use crate::auth;
use crate::error::AppResult;
use crate::repo::products;
use crate::routes::page;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use std::sync::Arc;
use tera::Context;

pub async fn wishlist_view(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_user(&state, &sid).await?;

    let ids = state.sessions().with_session(&sid, |s| s.wishlist.clone());
    let products = products::list_active_by_ids(state.pool(), &ids).await?;

    let mut ctx = Context::new();
    ctx.insert("products", &products);

    let body = page(&state, &sid, "wishlist.html", ctx).await?;
    Ok((jar, body).into_response())
}

pub async fn add_to_wishlist(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(product_id): Path<i64>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_user(&state, &sid).await?;

    let (status, count) = state.sessions().with_session(&sid, |s| {
        if s.wishlist.contains(&product_id) {
            ("exists", s.wishlist.len())
        } else {
            s.wishlist.push(product_id);
            ("added", s.wishlist.len())
        }
    });

    Ok((jar, Json(json!({ "status": status, "count": count }))).into_response())
}

pub async fn remove_from_wishlist(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(product_id): Path<i64>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);
    auth::require_user(&state, &sid).await?;

    let count = state.sessions().with_session(&sid, |s| {
        s.wishlist.retain(|&id| id != product_id);
        s.wishlist.len()
    });

    Ok((jar, Json(json!({ "status": "removed", "count": count }))).into_response())
}
