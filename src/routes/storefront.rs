//! Public catalog pages.

use crate::error::{AppError, AppResult};
use crate::repo::{categories, products};
use crate::routes::page;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use tera::Context;

const HOME_PRODUCT_LIMIT: i64 = 20;

pub async fn home(State(state): State<Arc<AppState>>, jar: CookieJar) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);

    let categories = categories::list_active(state.pool()).await?;
    let products = products::list_active(state.pool(), HOME_PRODUCT_LIMIT).await?;

    let mut ctx = Context::new();
    ctx.insert("categories", &categories);
    ctx.insert("products", &products);

    let body = page(&state, &sid, "home.html", ctx).await?;
    Ok((jar, body).into_response())
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<SearchParams>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);

    let results = if params.q.is_empty() {
        products::list_active(state.pool(), HOME_PRODUCT_LIMIT).await?
    } else {
        products::search_active(state.pool(), &params.q).await?
    };

    let mut ctx = Context::new();
    ctx.insert("products", &results);
    ctx.insert("query", &params.q);

    let body = page(&state, &sid, "search_results.html", ctx).await?;
    Ok((jar, body).into_response())
}

pub async fn category_products(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(category_id): Path<i64>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);

    let category = categories::find_by_id(state.pool(), category_id)
        .await?
        .ok_or(AppError::NotFound("category"))?;
    let products = products::list_active_by_category(state.pool(), category_id).await?;

    let mut ctx = Context::new();
    ctx.insert("category", &category);
    ctx.insert("products", &products);

    let body = page(&state, &sid, "category_products.html", ctx).await?;
    Ok((jar, body).into_response())
}

pub async fn product_detail(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(product_id): Path<i64>,
) -> AppResult<Response> {
    let (jar, sid) = state.sessions().ensure(jar);

    let product = products::find_by_id(state.pool(), product_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or(AppError::NotFound("product"))?;

    let mut ctx = Context::new();
    ctx.insert("product", &product);

    let body = page(&state, &sid, "product_detail.html", ctx).await?;
    Ok((jar, body).into_response())
}
